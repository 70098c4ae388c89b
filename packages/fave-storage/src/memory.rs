use std::{
	collections::{BTreeMap, HashMap},
	future,
	sync::{Mutex, MutexGuard},
};

use crate::{
	Error, Result,
	models::{GlobalSnapshot, PersonalList, ScanCursor, ScanPage, ScannedEntry},
	store::{BoxFuture, PersonalListStore, SnapshotStore},
};

/// Process-local implementation of both stores. Used by tests and single-node tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
	lists: Mutex<Lists>,
	snapshots: Mutex<HashMap<String, GlobalSnapshot>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock_lists(&self) -> MutexGuard<'_, Lists> {
		self.lists.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn load_sync(&self, user_id: &str, list_name: &str) -> Option<PersonalList> {
		self.lock_lists().owned.get(&(list_name.to_string(), user_id.to_string())).cloned()
	}

	fn save_sync(&self, list: &PersonalList) -> Result<PersonalList> {
		let mut lists = self.lock_lists();
		let key = (list.list_name.clone(), list.user_id.clone());
		let stored_version = lists.owned.get(&key).map(|stored| stored.version).unwrap_or(0);

		if stored_version != list.version {
			return Err(Error::Conflict(format!(
				"List {}:{} is at version {stored_version}, expected {}.",
				list.user_id, list.list_name, list.version
			)));
		}

		let mut next = list.clone();

		next.version = stored_version + 1;
		next.renumber();

		for entry in &mut next.entries {
			entry.first_seen = lists.first_seen_of(&list.list_name, &entry.item.id);
		}

		lists.owned.insert(key, next.clone());

		Ok(next)
	}

	fn scan_sync(&self, list_name: &str, after: Option<&ScanCursor>, limit: usize) -> ScanPage {
		let lists = self.lock_lists();
		let mut entries = Vec::with_capacity(limit);
		let mut next = None;

		'users: for ((name, user_id), list) in
			lists.owned.range((list_name.to_string(), String::new())..)
		{
			if name != list_name {
				break;
			}

			for entry in &list.entries {
				let cursor = ScanCursor { user_id: user_id.clone(), position: entry.position };

				if after.is_some_and(|after| &cursor <= after) {
					continue;
				}
				if entries.len() == limit {
					break 'users;
				}

				entries.push(ScannedEntry { user_id: user_id.clone(), entry: entry.clone() });

				next = Some(cursor);
			}
		}

		if entries.len() < limit {
			next = None;
		}

		ScanPage { entries, next }
	}

	fn list_names_sync(&self) -> Vec<String> {
		let lists = self.lock_lists();
		let mut names: Vec<String> = lists.owned.keys().map(|(name, _)| name.clone()).collect();

		names.dedup();

		names
	}
}
impl PersonalListStore for MemoryStore {
	fn load<'a>(
		&'a self,
		user_id: &'a str,
		list_name: &'a str,
	) -> BoxFuture<'a, Result<Option<PersonalList>>> {
		Box::pin(future::ready(Ok(self.load_sync(user_id, list_name))))
	}

	fn save<'a>(&'a self, list: &'a PersonalList) -> BoxFuture<'a, Result<PersonalList>> {
		Box::pin(future::ready(self.save_sync(list)))
	}

	fn scan<'a>(
		&'a self,
		list_name: &'a str,
		after: Option<&'a ScanCursor>,
		limit: usize,
	) -> BoxFuture<'a, Result<ScanPage>> {
		if limit == 0 {
			return Box::pin(future::ready(Err(Error::InvalidArgument(
				"Scan limit must be greater than zero.".to_string(),
			))));
		}

		Box::pin(future::ready(Ok(self.scan_sync(list_name, after, limit))))
	}

	fn list_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(future::ready(Ok(self.list_names_sync())))
	}
}
impl SnapshotStore for MemoryStore {
	fn get<'a>(&'a self, list_name: &'a str) -> BoxFuture<'a, Result<Option<GlobalSnapshot>>> {
		let snapshot = {
			let snapshots = self.snapshots.lock().unwrap_or_else(|err| err.into_inner());

			snapshots.get(list_name).cloned()
		};

		Box::pin(future::ready(Ok(snapshot)))
	}

	fn put<'a>(&'a self, snapshot: &'a GlobalSnapshot) -> BoxFuture<'a, Result<()>> {
		{
			let mut snapshots = self.snapshots.lock().unwrap_or_else(|err| err.into_inner());

			snapshots.insert(snapshot.list_name.clone(), snapshot.clone());
		}

		Box::pin(future::ready(Ok(())))
	}
}

#[derive(Debug, Default)]
struct Lists {
	// Keyed by (list_name, user_id) so a scan walks users in order.
	owned: BTreeMap<(String, String), PersonalList>,
	// Keyed by (list_name, item_id); never shrinks, like the Postgres item registry.
	first_seen: HashMap<(String, String), i64>,
	last_first_seen: i64,
}
impl Lists {
	fn first_seen_of(&mut self, list_name: &str, item_id: &str) -> i64 {
		let last = &mut self.last_first_seen;

		*self.first_seen.entry((list_name.to_string(), item_id.to_string())).or_insert_with(|| {
			*last += 1;

			*last
		})
	}
}
