use std::{future::Future, time::Duration};

use tokio::time;

use crate::Error;

const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Timeout and retry budget for durable-store calls.
#[derive(Clone, Copy, Debug)]
pub struct StorePolicy {
	pub timeout: Duration,
	pub max_retries: u32,
	pub backoff: Duration,
}
impl StorePolicy {
	pub fn from_config(cfg: &fave_config::Storage) -> Self {
		Self {
			timeout: Duration::from_millis(cfg.timeout_ms),
			max_retries: cfg.max_retries,
			backoff: Duration::from_millis(cfg.retry_backoff_ms),
		}
	}

	/// Runs `op` under the timeout, retrying transient failures with exponential backoff.
	/// Conflicts and rejected arguments return immediately.
	pub(crate) async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, StoreFailure>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = fave_storage::Result<T>>,
	{
		let mut backoff = self.backoff;
		let mut attempt = 0;

		loop {
			let failure = match time::timeout(self.timeout, op()).await {
				Ok(Ok(value)) => return Ok(value),
				Ok(Err(fave_storage::Error::Conflict(message))) =>
					return Err(StoreFailure::Conflict(message)),
				Ok(Err(
					err @ (fave_storage::Error::InvalidArgument(_) | fave_storage::Error::NotFound(_)),
				)) => return Err(StoreFailure::Rejected(err.to_string())),
				Ok(Err(err)) => err.to_string(),
				Err(_) => format!("Timed out after {} ms.", self.timeout.as_millis()),
			};

			if attempt >= self.max_retries {
				return Err(StoreFailure::Unavailable(format!(
					"{label} failed after {} attempts: {failure}",
					attempt + 1
				)));
			}

			attempt += 1;

			tracing::warn!(operation = label, attempt, error = %failure, "Durable store call failed; retrying.");

			time::sleep(backoff).await;

			backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
		}
	}
}

#[derive(Debug)]
pub(crate) enum StoreFailure {
	Conflict(String),
	Rejected(String),
	Unavailable(String),
}
impl StoreFailure {
	/// Maps a personal-list store failure into the service taxonomy.
	pub(crate) fn into_error(self) -> Error {
		match self {
			Self::Conflict(message) => Error::ConcurrentModification { message },
			Self::Rejected(message) => Error::InvalidRequest { message },
			Self::Unavailable(message) => Error::Storage { message },
		}
	}

	pub(crate) fn into_cache_error(self) -> Error {
		let message = match self {
			Self::Conflict(message) | Self::Rejected(message) | Self::Unavailable(message) => message,
		};

		Error::CacheUnavailable { message }
	}
}
