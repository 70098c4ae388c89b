pub mod add_item;
pub mod annotate;
pub mod cache;
pub mod move_item;
pub mod read;
pub mod rebuild;
pub mod remove_item;
pub mod retry;

mod error;

pub use add_item::{AddItemRequest, AddItemResponse};
pub use annotate::{SetAnnotationRequest, SetAnnotationResponse};
pub use cache::{CacheStats, RankingCache, ScoreDelta};
pub use error::{Error, Result};
pub use move_item::{MoveItemRequest, MoveItemResponse};
pub use rebuild::RebuildReport;
pub use remove_item::{RemoveItemRequest, RemoveItemResponse};
pub use retry::StorePolicy;

use std::sync::Arc;

use fave_config::Config;
use fave_domain::ScoreModel;
use fave_storage::{
	PersonalListStore, SnapshotStore,
	models::{PersonalEntry, PersonalList},
};
use retry::StoreFailure;

/// Score changes produced by one personal-list edit.
pub(crate) type Deltas = Vec<ScoreDelta>;

#[derive(Clone)]
pub struct Stores {
	pub lists: Arc<dyn PersonalListStore>,
	pub snapshots: Arc<dyn SnapshotStore>,
}

/// Personal-list mutations with the matching global-ranking updates.
///
/// A mutation commits to the personal-list store first. Its score deltas reach the cache only
/// after the commit succeeds, so the global view never counts an edit that was not persisted.
pub struct LeaderboardService {
	pub cfg: Config,
	pub model: ScoreModel,
	pub stores: Stores,
	pub cache: Arc<RankingCache>,
	policy: StorePolicy,
}
impl LeaderboardService {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		let cache = Arc::new(RankingCache::new(&cfg, Arc::clone(&stores.snapshots)));

		Self::with_cache(cfg, stores, cache)
	}

	pub fn with_cache(cfg: Config, stores: Stores, cache: Arc<RankingCache>) -> Self {
		let model = ScoreModel::from_config(&cfg.ranking);
		let policy = StorePolicy::from_config(&cfg.storage);

		Self { cfg, model, stores, cache, policy }
	}

	pub(crate) fn max_faves(&self) -> usize {
		self.cfg.ranking.max_faves as usize
	}

	pub(crate) async fn load_list(&self, user_id: &str, list_name: &str) -> Result<PersonalList> {
		let loaded = self
			.policy
			.run("personal list load", || self.stores.lists.load(user_id, list_name))
			.await
			.map_err(StoreFailure::into_error)?;

		Ok(loaded.unwrap_or_else(|| PersonalList::empty(user_id, list_name)))
	}

	/// Load, edit, and save under optimistic concurrency, then patch the cache.
	///
	/// `edit` returns the score deltas of its change, or `None` when the list is left untouched.
	/// Business-rule errors from `edit` abort before anything is written. A version conflict
	/// reloads and re-runs `edit`, up to the configured retry budget.
	pub(crate) async fn mutate<F>(
		&self,
		user_id: &str,
		list_name: &str,
		mut edit: F,
	) -> Result<PersonalList>
	where
		F: FnMut(&mut PersonalList) -> Result<Option<Deltas>>,
	{
		let mut conflicts = 0;

		loop {
			let mut list = self.load_list(user_id, list_name).await?;
			let Some(mut deltas) = edit(&mut list)? else {
				return Ok(list);
			};

			list.renumber();

			let saved =
				self.policy.run("personal list save", || self.stores.lists.save(&list)).await;

			match saved {
				Ok(saved) => {
					// Items new to the list-name only get their key from the store.
					for change in &mut deltas {
						if let Some(position) = saved.position_of(&change.item.id) {
							change.first_seen = saved.entries[position].first_seen;
						}
					}

					self.patch_cache(list_name, deltas).await;

					return Ok(saved);
				},
				Err(StoreFailure::Conflict(message)) => {
					if conflicts >= self.policy.max_retries {
						return Err(Error::ConcurrentModification { message });
					}

					conflicts += 1;

					tracing::debug!(
						user_id,
						list_name,
						attempt = conflicts,
						"Personal list changed concurrently; reloading."
					);
				},
				Err(failure) => return Err(failure.into_error()),
			}
		}
	}

	/// Applies committed deltas on a detached task so caller cancellation cannot interrupt them.
	/// A failed patch drops the cached list instead of failing the committed mutation.
	async fn patch_cache(&self, list_name: &str, deltas: Deltas) {
		if deltas.is_empty() {
			return;
		}

		let cache = Arc::clone(&self.cache);
		let task_list_name = list_name.to_string();
		let patched =
			tokio::spawn(async move { cache.apply_deltas(&task_list_name, &deltas).await }).await;
		let failure = match patched {
			Ok(Ok(_)) => return,
			Ok(Err(err)) => err.to_string(),
			Err(err) => err.to_string(),
		};

		tracing::warn!(
			list_name,
			error = %failure,
			"Global ranking patch failed; dropping the cached leaderboard."
		);

		self.cache.invalidate(list_name).await;
	}
}

pub(crate) fn acting_user(user_id: &str) -> Result<&str> {
	let user_id = user_id.trim();

	if user_id.is_empty() {
		return Err(Error::NotLoggedIn);
	}

	Ok(user_id)
}

pub(crate) fn required_list_name(raw: &str) -> Result<String> {
	fave_domain::list_name::normalize(raw).ok_or_else(|| Error::InvalidRequest {
		message: "list_name must not be empty.".to_string(),
	})
}

pub(crate) fn required_item_id(item_id: &str) -> Result<&str> {
	let item_id = item_id.trim();

	if item_id.is_empty() {
		return Err(Error::InvalidRequest { message: "item_id must not be empty.".to_string() });
	}

	Ok(item_id)
}

pub(crate) fn score_delta(entry: &PersonalEntry, delta: f64) -> ScoreDelta {
	ScoreDelta { item: entry.item.clone(), first_seen: entry.first_seen, delta }
}

pub(crate) fn not_in_list(item_id: &str, list_name: &str) -> Error {
	Error::NotFound { message: format!("Item {item_id} is not in list {list_name}.") }
}
