use std::{collections::HashMap, num::NonZeroUsize};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{LeaderboardService, Result, required_list_name};
use fave_domain::BoundedTopK;
use fave_storage::models::{GlobalSnapshot, Item, RankedItem, ScanCursor};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RebuildReport {
	pub list_name: String,
	pub scanned_entries: u64,
	pub distinct_items: u64,
	pub retained: u64,
	pub rebuilt_at: OffsetDateTime,
}

impl LeaderboardService {
	/// Recomputes a list-name's global top-K from every personal list and replaces its snapshot.
	///
	/// Totals are accumulated per item in whole points over a paged scan, then reduced through a
	/// bounded heap, so memory is proportional to the distinct items plus K. Items enter the heap
	/// in `first_seen` order, which is the order the cache uses for equal scores.
	pub async fn rebuild_global_ranking(&self, list_name: &str) -> Result<RebuildReport> {
		let list_name = required_list_name(list_name)?;
		let page_size = self.cfg.storage.scan_page_size as usize;
		let mut totals: HashMap<String, Total> = HashMap::new();
		let mut cursor: Option<ScanCursor> = None;
		let mut scanned_entries = 0_u64;

		loop {
			let page = self
				.policy
				.run("personal list scan", || {
					self.stores.lists.scan(&list_name, cursor.as_ref(), page_size)
				})
				.await
				.map_err(|failure| failure.into_error())?;

			for scanned in page.entries {
				let points = self.model.contribution_points(scanned.entry.position);

				scanned_entries += 1;

				totals
					.entry(scanned.entry.item.id.clone())
					.or_insert_with(|| Total {
						first_seen: scanned.entry.first_seen,
						item: scanned.entry.item,
						points: 0,
					})
					.points += points;
			}

			match page.next {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		let distinct_items = totals.len() as u64;
		let mut ordered: Vec<Total> = totals.into_values().collect();

		ordered.sort_by(|a, b| {
			a.first_seen.cmp(&b.first_seen).then_with(|| a.item.id.cmp(&b.item.id))
		});

		let capacity = NonZeroUsize::new(self.max_faves()).unwrap_or(NonZeroUsize::MIN);
		let mut top: BoundedTopK<Total, i64> = BoundedTopK::new(capacity);

		for total in ordered {
			let points = total.points;

			top.offer(total, points);
		}

		let entries: Vec<RankedItem> = top
			.drain_descending()
			.into_iter()
			.map(|(total, points)| RankedItem {
				item: total.item,
				score: self.model.to_score(points),
				first_seen: total.first_seen,
			})
			.collect();
		let rebuilt_at = OffsetDateTime::now_utc();
		let snapshot = GlobalSnapshot { list_name: list_name.clone(), entries, rebuilt_at };

		self.policy
			.run("snapshot put", || self.stores.snapshots.put(&snapshot))
			.await
			.map_err(|failure| failure.into_cache_error())?;
		self.cache.invalidate(&list_name).await;

		let retained = snapshot.entries.len() as u64;

		tracing::info!(
			list_name = list_name.as_str(),
			scanned_entries,
			distinct_items,
			retained,
			"Global ranking rebuilt."
		);

		Ok(RebuildReport { list_name, scanned_entries, distinct_items, retained, rebuilt_at })
	}
}

struct Total {
	item: Item,
	first_seen: i64,
	points: i64,
}
