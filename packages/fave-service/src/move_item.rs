use serde::{Deserialize, Serialize};

use crate::{
	Error, LeaderboardService, Result, acting_user, not_in_list, required_item_id,
	required_list_name, score_delta,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveItemRequest {
	pub user_id: String,
	pub list_name: String,
	pub item_id: String,
	pub new_position: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveItemResponse {
	pub list_name: String,
	pub from: usize,
	pub to: usize,
	pub version: i64,
}

impl LeaderboardService {
	/// Moves an item within the user's list. Every entry whose position changes, the moved item
	/// and the ones shifted past it, is re-scored for its new position.
	pub async fn move_item(&self, req: MoveItemRequest) -> Result<MoveItemResponse> {
		let user_id = acting_user(&req.user_id)?;
		let list_name = required_list_name(&req.list_name)?;
		let item_id = required_item_id(&req.item_id)?;
		let to = req.new_position;
		let model = self.model;
		let mut from = to;
		let list = self
			.mutate(user_id, &list_name, |list| {
				let len = list.len();

				if to >= len {
					return Err(Error::IndexOutOfRange { index: to, len });
				}

				let Some(old) = list.position_of(item_id) else {
					return Err(not_in_list(item_id, &list_name));
				};

				from = old;

				if old == to {
					return Ok(None);
				}

				let entry = list.entries.remove(old);
				let mut deltas = Vec::with_capacity(old.abs_diff(to) + 1);

				deltas.push(score_delta(&entry, model.delta_for_reorder(old, to)));
				list.entries.insert(to, entry);

				if to < old {
					// Entries in [to, old) slide down one place.
					for new_position in to + 1..=old {
						deltas.push(score_delta(
							&list.entries[new_position],
							model.delta_for_reorder(new_position - 1, new_position),
						));
					}
				} else {
					// Entries in (old, to] slide up one place.
					for new_position in old..to {
						deltas.push(score_delta(
							&list.entries[new_position],
							model.delta_for_reorder(new_position + 1, new_position),
						));
					}
				}

				Ok(Some(deltas))
			})
			.await?;

		tracing::debug!(user_id, list_name = list_name.as_str(), item_id, from, to, "Item moved.");

		Ok(MoveItemResponse { list_name, from, to, version: list.version })
	}
}
