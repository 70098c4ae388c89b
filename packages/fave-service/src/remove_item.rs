use serde::{Deserialize, Serialize};

use crate::{
	LeaderboardService, Result, acting_user, not_in_list, required_item_id, required_list_name,
	score_delta,
};
use fave_storage::models::Item;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveItemRequest {
	pub user_id: String,
	pub list_name: String,
	pub item_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveItemResponse {
	pub list_name: String,
	pub removed: Item,
	pub version: i64,
}

impl LeaderboardService {
	/// Removes the item, withdraws its contribution, and credits every entry that moves up one
	/// place to close the gap.
	pub async fn remove_item(&self, req: RemoveItemRequest) -> Result<RemoveItemResponse> {
		let user_id = acting_user(&req.user_id)?;
		let list_name = required_list_name(&req.list_name)?;
		let item_id = required_item_id(&req.item_id)?;
		let model = self.model;
		let mut removed = None;
		let list = self
			.mutate(user_id, &list_name, |list| {
				let Some(position) = list.position_of(item_id) else {
					return Err(not_in_list(item_id, &list_name));
				};
				let entry = list.entries.remove(position);
				let mut deltas = Vec::with_capacity(list.len() - position + 1);

				deltas.push(score_delta(&entry, -model.contribution_for_position(position)));

				for (offset, shifted) in list.entries[position..].iter().enumerate() {
					let new_position = position + offset;

					deltas.push(score_delta(
						shifted,
						model.delta_for_reorder(new_position + 1, new_position),
					));
				}

				removed = Some(entry.item);

				Ok(Some(deltas))
			})
			.await?;
		let Some(removed) = removed else {
			return Err(not_in_list(item_id, &list_name));
		};

		tracing::debug!(user_id, list_name = list_name.as_str(), item_id, "Item removed.");

		Ok(RemoveItemResponse { list_name, removed, version: list.version })
	}
}
