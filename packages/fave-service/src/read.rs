use crate::{Error, LeaderboardService, Result, required_item_id, required_list_name};
use fave_storage::models::{PersonalList, RankedItem};

impl LeaderboardService {
	/// The owner's list in position order; an empty list at version zero when nothing was saved.
	pub async fn get_personal_list(&self, user_id: &str, list_name: &str) -> Result<PersonalList> {
		let user_id = user_id.trim();

		if user_id.is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must not be empty.".to_string() });
		}

		let list_name = required_list_name(list_name)?;

		self.load_list(user_id, &list_name).await
	}

	/// Global top-K, best first, served from the cache and primed from the snapshot on a miss.
	pub async fn get_global_top_k(&self, list_name: &str) -> Result<Vec<RankedItem>> {
		let list_name = required_list_name(list_name)?;

		self.cache.top_k(&list_name).await
	}

	/// Global score of one item, priming the list from its snapshot first.
	///
	/// Zero for an item nobody lists. After a restart it is also zero for an item that sits
	/// outside the snapshot's top-K and has not been touched since; a rebuild is the only full
	/// recount.
	pub async fn get_global_score(&self, list_name: &str, item_id: &str) -> Result<f64> {
		let list_name = required_list_name(list_name)?;
		let item_id = required_item_id(item_id)?;

		self.cache.primed_score(&list_name, item_id).await
	}

	/// Every list-name that at least one user has saved a list under.
	pub async fn list_names(&self) -> Result<Vec<String>> {
		self.policy
			.run("list names", || self.stores.lists.list_names())
			.await
			.map_err(|failure| failure.into_error())
	}
}
