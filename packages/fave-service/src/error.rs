pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not logged in.")]
	NotLoggedIn,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Index {index} is out of range for a list of {len} entries.")]
	IndexOutOfRange { index: usize, len: usize },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Item {item_id} is already in the list.")]
	DuplicateItem { item_id: String },
	#[error("List already holds the maximum of {max} items.")]
	ListFull { max: usize },
	#[error("Cache unavailable: {message}")]
	CacheUnavailable { message: String },
	#[error("Concurrent modification: {message}")]
	ConcurrentModification { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Whether resubmitting the same request unchanged may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			Self::CacheUnavailable { .. } | Self::ConcurrentModification { .. } | Self::Storage { .. }
		)
	}
}
