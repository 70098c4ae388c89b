pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Service(#[from] fave_service::Error),
	#[error(transparent)]
	Storage(#[from] fave_storage::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error("Rebuild failed for {failed} of {total} lists.")]
	Incomplete { failed: usize, total: usize },
}
