#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	/// The stored version moved on since the caller loaded it.
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Unavailable: {0}")]
	Unavailable(String),
}
