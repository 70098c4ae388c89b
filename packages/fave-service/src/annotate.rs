use serde::{Deserialize, Serialize};

use crate::{
	Error, LeaderboardService, Result, acting_user, not_in_list, required_item_id,
	required_list_name,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetAnnotationRequest {
	pub user_id: String,
	pub list_name: String,
	pub item_id: String,
	pub annotation: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetAnnotationResponse {
	pub list_name: String,
	pub item_id: String,
	pub annotation: Option<String>,
	pub version: i64,
}

impl LeaderboardService {
	/// Sets or clears the user's note on an entry. Annotations never affect scores.
	pub async fn set_annotation(&self, req: SetAnnotationRequest) -> Result<SetAnnotationResponse> {
		let user_id = acting_user(&req.user_id)?;
		let list_name = required_list_name(&req.list_name)?;
		let item_id = required_item_id(&req.item_id)?;
		let annotation = req
			.annotation
			.as_deref()
			.map(str::trim)
			.filter(|text| !text.is_empty())
			.map(str::to_string);
		let max_chars = self.cfg.ranking.max_annotation_chars as usize;

		if let Some(text) = annotation.as_deref()
			&& text.chars().count() > max_chars
		{
			return Err(Error::InvalidRequest {
				message: format!("annotation must be at most {max_chars} characters."),
			});
		}

		let list = self
			.mutate(user_id, &list_name, |list| {
				let Some(position) = list.position_of(item_id) else {
					return Err(not_in_list(item_id, &list_name));
				};
				let entry = &mut list.entries[position];

				if entry.annotation == annotation {
					return Ok(None);
				}

				entry.annotation = annotation.clone();

				Ok(Some(Vec::new()))
			})
			.await?;

		Ok(SetAnnotationResponse {
			list_name,
			item_id: item_id.to_string(),
			annotation,
			version: list.version,
		})
	}
}
