use std::{
	cmp::Ordering,
	collections::HashMap,
	num::NonZeroUsize,
	sync::{
		Arc, Mutex, MutexGuard, PoisonError,
		atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering},
	},
};

use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::{Error, Result, retry::StorePolicy};
use fave_config::Config;
use fave_domain::ScoreModel;
use fave_storage::{
	SnapshotStore,
	models::{GlobalSnapshot, Item, RankedItem},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub evictions: u64,
	pub invalidations: u64,
}

/// One item's score change for a list-name.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreDelta {
	pub item: Item,
	/// The item's durable tie-break key, see `PersonalEntry::first_seen`.
	pub first_seen: i64,
	pub delta: f64,
}

/// In-memory global leaderboards, one per list-name, primed lazily from the snapshot store.
///
/// Each list-name owns a slot guarded by an async mutex. Priming happens with that mutex held, so
/// concurrent first readers of one list issue a single durable read while other lists proceed
/// independently. Primed lists beyond `max_lists` are evicted least recently used first.
///
/// Scores are held as whole points of the [`ScoreModel`], so totals reached through different
/// delta sequences compare exactly. Equal scores rank the lower `first_seen` first.
pub struct RankingCache {
	snapshots: Arc<dyn SnapshotStore>,
	policy: StorePolicy,
	model: ScoreModel,
	capacity: NonZeroUsize,
	max_lists: usize,
	slots: Mutex<HashMap<String, Arc<Slot>>>,
	clock: AtomicU64,
	primed: AtomicUsize,
	counters: Counters,
}
impl RankingCache {
	pub fn new(cfg: &Config, snapshots: Arc<dyn SnapshotStore>) -> Self {
		let capacity =
			NonZeroUsize::new(cfg.ranking.max_faves as usize).unwrap_or(NonZeroUsize::MIN);

		Self::with_limits(
			snapshots,
			StorePolicy::from_config(&cfg.storage),
			ScoreModel::from_config(&cfg.ranking),
			capacity,
			cfg.cache.max_lists as usize,
		)
	}

	pub fn with_limits(
		snapshots: Arc<dyn SnapshotStore>,
		policy: StorePolicy,
		model: ScoreModel,
		capacity: NonZeroUsize,
		max_lists: usize,
	) -> Self {
		Self {
			snapshots,
			policy,
			model,
			capacity,
			max_lists: max_lists.max(1),
			slots: Mutex::new(HashMap::new()),
			clock: AtomicU64::new(0),
			primed: AtomicUsize::new(0),
			counters: Counters::default(),
		}
	}

	/// Current score of `item_id`. Zero for an untracked item or a list that is not primed; never
	/// reads the durable store.
	pub async fn score(&self, list_name: &str, item_id: &str) -> f64 {
		let Some(slot) = self.existing_slot(list_name) else {
			return 0.0;
		};
		let board = slot.board.lock().await;

		board.as_ref().map_or(0.0, |board| board.score(item_id))
	}

	/// Like [`Self::score`], but primes the list first. Still zero for an item that sits outside
	/// the primed top-K and has not changed since priming.
	pub async fn primed_score(&self, list_name: &str, item_id: &str) -> Result<f64> {
		let slot = self.slot(list_name);
		let score = {
			let mut board = slot.board.lock().await;

			self.prime(list_name, &mut board).await?.score(item_id)
		};

		self.evict_over_capacity();

		Ok(score)
	}

	/// Adds the delta to the item's score, priming the list first when needed, and returns the
	/// new score.
	pub async fn apply_delta(&self, list_name: &str, change: ScoreDelta) -> Result<f64> {
		let scores = self.apply_deltas(list_name, &[change]).await?;

		Ok(scores.first().copied().unwrap_or(0.0))
	}

	/// Applies every delta under one acquisition of the list's lock, so readers never observe a
	/// partially applied mutation.
	pub async fn apply_deltas(&self, list_name: &str, changes: &[ScoreDelta]) -> Result<Vec<f64>> {
		let slot = self.slot(list_name);
		let scores = {
			let mut board = slot.board.lock().await;
			let primed = self.prime(list_name, &mut board).await?;
			let capacity = self.capacity.get();

			changes
				.iter()
				.map(|change| primed.apply(&change.item, change.first_seen, change.delta, capacity))
				.collect()
		};

		self.evict_over_capacity();

		Ok(scores)
	}

	/// Current top-K, best first.
	pub async fn top_k(&self, list_name: &str) -> Result<Vec<RankedItem>> {
		let slot = self.slot(list_name);
		let ranked = {
			let mut board = slot.board.lock().await;

			self.prime(list_name, &mut board).await?.ranked_items()
		};

		self.evict_over_capacity();

		Ok(ranked)
	}

	/// Drops the list's in-memory state; the next access re-primes from the snapshot store.
	pub async fn invalidate(&self, list_name: &str) {
		let Some(slot) = self.existing_slot(list_name) else {
			return;
		};
		let mut board = slot.board.lock().await;

		if board.take().is_some() {
			self.primed.fetch_sub(1, AtomicOrdering::Relaxed);
			self.counters.invalidations.fetch_add(1, AtomicOrdering::Relaxed);

			tracing::debug!(list_name, "Leaderboard invalidated.");
		}
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.counters.hits.load(AtomicOrdering::Relaxed),
			misses: self.counters.misses.load(AtomicOrdering::Relaxed),
			evictions: self.counters.evictions.load(AtomicOrdering::Relaxed),
			invalidations: self.counters.invalidations.load(AtomicOrdering::Relaxed),
		}
	}

	pub fn primed_lists(&self) -> usize {
		self.primed.load(AtomicOrdering::Relaxed)
	}

	async fn prime<'g>(
		&self,
		list_name: &str,
		board: &'g mut Option<Leaderboard>,
	) -> Result<&'g mut Leaderboard> {
		if board.is_some() {
			self.counters.hits.fetch_add(1, AtomicOrdering::Relaxed);
		} else {
			self.counters.misses.fetch_add(1, AtomicOrdering::Relaxed);

			let snapshot = self
				.policy
				.run("snapshot get", || self.snapshots.get(list_name))
				.await
				.map_err(|failure| failure.into_cache_error())?;
			let loaded = Leaderboard::from_snapshot(self.model, snapshot, self.capacity.get());

			tracing::debug!(list_name, entries = loaded.top.len(), "Leaderboard primed.");

			*board = Some(loaded);

			self.primed.fetch_add(1, AtomicOrdering::Relaxed);
		}

		board.as_mut().ok_or_else(|| Error::CacheUnavailable {
			message: format!("Leaderboard for {list_name} is not primed."),
		})
	}

	fn slot(&self, list_name: &str) -> Arc<Slot> {
		let tick = self.clock.fetch_add(1, AtomicOrdering::Relaxed) + 1;
		let mut slots = self.lock_slots();
		let slot = slots.entry(list_name.to_string()).or_insert_with(|| Arc::new(Slot::default()));

		slot.last_used.store(tick, AtomicOrdering::Relaxed);

		Arc::clone(slot)
	}

	fn existing_slot(&self, list_name: &str) -> Option<Arc<Slot>> {
		self.lock_slots().get(list_name).cloned()
	}

	fn evict_over_capacity(&self) {
		if self.primed.load(AtomicOrdering::Relaxed) <= self.max_lists {
			return;
		}

		let mut slots = self.lock_slots();
		let mut candidates: Vec<(u64, String)> = slots
			.iter()
			.map(|(name, slot)| (slot.last_used.load(AtomicOrdering::Relaxed), name.clone()))
			.collect();

		candidates.sort_unstable();

		for (_, name) in candidates {
			if self.primed.load(AtomicOrdering::Relaxed) <= self.max_lists {
				break;
			}

			let Some(slot) = slots.get(&name) else {
				continue;
			};
			// A busy slot is in use right now and is skipped.
			let Ok(mut board) = slot.board.try_lock() else {
				continue;
			};

			if board.take().is_some() {
				self.primed.fetch_sub(1, AtomicOrdering::Relaxed);
				self.counters.evictions.fetch_add(1, AtomicOrdering::Relaxed);

				tracing::debug!(list_name = name.as_str(), "Leaderboard evicted.");
			}

			drop(board);

			if Arc::strong_count(slot) == 1 {
				slots.remove(&name);
			}
		}
	}

	fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot>>> {
		self.slots.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[derive(Default)]
struct Counters {
	hits: AtomicU64,
	misses: AtomicU64,
	evictions: AtomicU64,
	invalidations: AtomicU64,
}

#[derive(Default)]
struct Slot {
	last_used: AtomicU64,
	board: AsyncMutex<Option<Leaderboard>>,
}

/// Every item scored since priming, plus the ordered top-K view over them.
///
/// Scores are whole points; an item whose total reaches zero is no longer referenced by any list
/// and stops being tracked.
#[derive(Debug)]
struct Leaderboard {
	model: ScoreModel,
	tracked: HashMap<String, Tracked>,
	top: Vec<Rank>,
}
impl Leaderboard {
	fn new(model: ScoreModel) -> Self {
		Self { model, tracked: HashMap::new(), top: Vec::new() }
	}

	fn from_snapshot(
		model: ScoreModel,
		snapshot: Option<GlobalSnapshot>,
		capacity: usize,
	) -> Self {
		let mut board = Self::new(model);
		let Some(snapshot) = snapshot else {
			return board;
		};

		for ranked in snapshot.entries {
			let points = model.to_points(ranked.score);

			if board.top.len() >= capacity
				|| points <= 0
				|| board.tracked.contains_key(&ranked.item.id)
			{
				continue;
			}

			let first_seen = ranked.first_seen;

			board.top.push(Rank { id: ranked.item.id.clone(), points, first_seen });
			board.tracked.insert(
				ranked.item.id.clone(),
				Tracked { item: ranked.item, points, first_seen, ranked: true },
			);
		}

		board.top.sort_by(Rank::cmp_rank);

		board
	}

	fn score(&self, item_id: &str) -> f64 {
		self.tracked.get(item_id).map_or(0.0, |tracked| self.model.to_score(tracked.points))
	}

	fn apply(&mut self, item: &Item, first_seen: i64, delta: f64, capacity: usize) -> f64 {
		let delta = self.model.to_points(delta);
		let tracked = self.tracked.entry(item.id.clone()).or_insert_with(|| Tracked {
			item: item.clone(),
			points: 0,
			first_seen,
			ranked: false,
		});

		tracked.points += delta;
		tracked.item = item.clone();

		let rank =
			Rank { id: item.id.clone(), points: tracked.points, first_seen: tracked.first_seen };
		let was_ranked = tracked.ranked;

		if rank.points <= 0 {
			self.tracked.remove(&item.id);

			if was_ranked {
				self.unrank(&item.id);
				self.promote_best_outsider(capacity);
			}

			return 0.0;
		}

		let score = self.model.to_score(rank.points);

		if was_ranked {
			self.unrank(&item.id);
			self.insert_ranked(rank);

			if delta < 0 {
				self.promote_best_outsider(capacity);
			}
		} else if self.top.len() < capacity
			|| self.top.last().is_some_and(|last| rank.cmp_rank(last) == Ordering::Less)
		{
			self.insert_ranked(rank);

			if self.top.len() > capacity {
				self.demote_last();
			}
		}

		score
	}

	fn ranked_items(&self) -> Vec<RankedItem> {
		self.top
			.iter()
			.filter_map(|rank| {
				self.tracked.get(&rank.id).map(|tracked| RankedItem {
					item: tracked.item.clone(),
					score: self.model.to_score(rank.points),
					first_seen: rank.first_seen,
				})
			})
			.collect()
	}

	fn unrank(&mut self, item_id: &str) {
		if let Some(idx) = self.top.iter().position(|rank| rank.id == item_id) {
			self.top.remove(idx);
		}
		if let Some(tracked) = self.tracked.get_mut(item_id) {
			tracked.ranked = false;
		}
	}

	fn insert_ranked(&mut self, rank: Rank) {
		if let Some(tracked) = self.tracked.get_mut(&rank.id) {
			tracked.ranked = true;
		}

		let idx = self.top.partition_point(|held| held.cmp_rank(&rank) == Ordering::Less);

		self.top.insert(idx, rank);
	}

	fn demote_last(&mut self) {
		if let Some(last) = self.top.pop()
			&& let Some(tracked) = self.tracked.get_mut(&last.id)
		{
			tracked.ranked = false;
		}
	}

	/// Refills the top view after a ranked item dropped. One swap is enough: every other ranked
	/// item still outranks every outsider.
	fn promote_best_outsider(&mut self, capacity: usize) {
		if self.tracked.len() <= self.top.len() {
			return;
		}

		let best = self
			.tracked
			.iter()
			.filter(|(_, tracked)| !tracked.ranked)
			.map(|(id, tracked)| Rank {
				id: id.clone(),
				points: tracked.points,
				first_seen: tracked.first_seen,
			})
			.min_by(Rank::cmp_rank);
		let Some(best) = best else {
			return;
		};

		if self.top.len() < capacity {
			self.insert_ranked(best);
		} else if self.top.last().is_some_and(|last| best.cmp_rank(last) == Ordering::Less) {
			self.demote_last();
			self.insert_ranked(best);
		}
	}
}

#[derive(Debug)]
struct Tracked {
	item: Item,
	points: i64,
	first_seen: i64,
	ranked: bool,
}

#[derive(Clone, Debug)]
struct Rank {
	id: String,
	points: i64,
	first_seen: i64,
}
impl Rank {
	/// `Less` means `self` ranks ahead of `other`. Item ids only separate entries whose keys were
	/// never assigned.
	fn cmp_rank(&self, other: &Self) -> Ordering {
		other
			.points
			.cmp(&self.points)
			.then_with(|| self.first_seen.cmp(&other.first_seen))
			.then_with(|| self.id.cmp(&other.id))
	}
}
