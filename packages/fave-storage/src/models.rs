use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A song. Title and artist ride along for display and never influence ranking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
	pub id: String,
	pub title: String,
	pub artist: String,
}
impl Item {
	pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
		Self { id: id.into(), title: title.into(), artist: artist.into() }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonalEntry {
	pub item: Item,
	pub position: usize,
	pub annotation: Option<String>,
	/// Order in which the item first appeared under this list-name, across all users. Assigned
	/// by the store on save and never changed afterwards; zero until then. Equal global scores
	/// rank the lower value first.
	#[serde(default)]
	pub first_seen: i64,
}
impl PersonalEntry {
	pub fn new(item: Item, position: usize) -> Self {
		Self { item, position, annotation: None, first_seen: 0 }
	}
}

/// One user's ranked list for one list-name.
///
/// `version` is the optimistic-concurrency token: zero means "never saved".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonalList {
	pub user_id: String,
	pub list_name: String,
	pub version: i64,
	pub entries: Vec<PersonalEntry>,
}
impl PersonalList {
	pub fn empty(user_id: &str, list_name: &str) -> Self {
		Self {
			user_id: user_id.to_string(),
			list_name: list_name.to_string(),
			version: 0,
			entries: Vec::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn position_of(&self, item_id: &str) -> Option<usize> {
		self.entries.iter().position(|entry| entry.item.id == item_id)
	}

	/// Restores dense 0-based positions after an insert, removal, or move.
	pub fn renumber(&mut self) {
		for (idx, entry) in self.entries.iter_mut().enumerate() {
			entry.position = idx;
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
	pub item: Item,
	pub score: f64,
	#[serde(default)]
	pub first_seen: i64,
}

/// Last committed top-K for a list-name, best first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalSnapshot {
	pub list_name: String,
	pub entries: Vec<RankedItem>,
	pub rebuilt_at: OffsetDateTime,
}

/// Keyset position inside a rebuild scan: the last `(user_id, position)` returned.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanCursor {
	pub user_id: String,
	pub position: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScannedEntry {
	pub user_id: String,
	pub entry: PersonalEntry,
}

#[derive(Clone, Debug, Default)]
pub struct ScanPage {
	pub entries: Vec<ScannedEntry>,
	pub next: Option<ScanCursor>,
}
