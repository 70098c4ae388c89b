use std::{future::Future, pin::Pin};

use crate::{
	Result,
	models::{GlobalSnapshot, PersonalList, ScanCursor, ScanPage},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable home of every user's personal lists.
pub trait PersonalListStore
where
	Self: Send + Sync,
{
	/// `Ok(None)` when the user never saved a list under `list_name`.
	fn load<'a>(
		&'a self,
		user_id: &'a str,
		list_name: &'a str,
	) -> BoxFuture<'a, Result<Option<PersonalList>>>;

	/// Replaces the stored list when its version still equals `list.version`, and returns the
	/// list as stored: renumbered, at its new version, with every entry's `first_seen` filled in.
	/// A moved version is reported as [`crate::Error::Conflict`].
	fn save<'a>(&'a self, list: &'a PersonalList) -> BoxFuture<'a, Result<PersonalList>>;

	/// Entries referencing `list_name` across all users in `(user_id, position)` order, starting
	/// strictly after `after`.
	fn scan<'a>(
		&'a self,
		list_name: &'a str,
		after: Option<&'a ScanCursor>,
		limit: usize,
	) -> BoxFuture<'a, Result<ScanPage>>;

	fn list_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// Durable home of the last committed top-K per list-name.
pub trait SnapshotStore
where
	Self: Send + Sync,
{
	/// `Ok(None)` when no rebuild ever wrote a snapshot for `list_name`.
	fn get<'a>(&'a self, list_name: &'a str) -> BoxFuture<'a, Result<Option<GlobalSnapshot>>>;

	fn put<'a>(&'a self, snapshot: &'a GlobalSnapshot) -> BoxFuture<'a, Result<()>>;
}
