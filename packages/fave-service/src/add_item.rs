use serde::{Deserialize, Serialize};

use crate::{
	Error, LeaderboardService, Result, acting_user, required_item_id, required_list_name,
	score_delta,
};
use fave_storage::models::{Item, PersonalEntry};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddItemRequest {
	pub user_id: String,
	pub list_name: String,
	pub item: Item,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddItemResponse {
	pub list_name: String,
	pub position: usize,
	pub version: i64,
}

impl LeaderboardService {
	/// Appends the item at the end of the user's list and credits its position's contribution.
	pub async fn add_item(&self, req: AddItemRequest) -> Result<AddItemResponse> {
		let user_id = acting_user(&req.user_id)?;
		let list_name = required_list_name(&req.list_name)?;
		let item = Item::new(
			required_item_id(&req.item.id)?,
			req.item.title.trim(),
			req.item.artist.trim(),
		);
		let max_faves = self.max_faves();
		let model = self.model;
		let list = self
			.mutate(user_id, &list_name, |list| {
				if list.len() >= max_faves {
					return Err(Error::ListFull { max: max_faves });
				}
				if list.position_of(&item.id).is_some() {
					return Err(Error::DuplicateItem { item_id: item.id.clone() });
				}

				let position = list.len();
				let entry = PersonalEntry::new(item.clone(), position);
				let delta = score_delta(&entry, model.contribution_for_position(position));

				list.entries.push(entry);

				Ok(Some(vec![delta]))
			})
			.await?;
		let position = list.len().saturating_sub(1);

		tracing::debug!(
			user_id,
			list_name = list_name.as_str(),
			item_id = item.id.as_str(),
			position,
			"Item added."
		);

		Ok(AddItemResponse { list_name, position, version: list.version })
	}
}
