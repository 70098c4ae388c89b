use std::{cmp::Ordering, collections::BinaryHeap, num::NonZeroUsize};

/// Keeps the `capacity` highest-scoring observations of an unbounded stream in O(capacity)
/// memory.
///
/// Offers are not deduplicated; callers reduce to one observation per item first. Equal scores
/// are ordered by offer order, earliest first, and a late offer never displaces an equal score
/// already held. Scores that must tie exactly should use an exact type such as whole points.
#[derive(Debug)]
pub struct BoundedTopK<T, S = f64> {
	capacity: NonZeroUsize,
	heap: BinaryHeap<Held<T, S>>,
	next_seq: u64,
}
impl<T, S> BoundedTopK<T, S>
where
	S: Copy + PartialOrd,
{
	pub fn new(capacity: NonZeroUsize) -> Self {
		Self { capacity, heap: BinaryHeap::with_capacity(capacity.get() + 1), next_seq: 0 }
	}

	/// Lowest score currently held, if any.
	pub fn min_score(&self) -> Option<S> {
		self.heap.peek().map(|held| held.score)
	}

	/// Returns `true` when the observation was retained.
	pub fn offer(&mut self, item: T, score: S) -> bool {
		let seq = self.next_seq;

		self.next_seq += 1;

		if self.heap.len() < self.capacity.get() {
			self.heap.push(Held { score, seq, item });

			return true;
		}

		let Some(worst) = self.heap.peek() else {
			return false;
		};

		if score > worst.score {
			self.heap.pop();
			self.heap.push(Held { score, seq, item });

			return true;
		}

		false
	}

	pub fn drain_descending(self) -> Vec<(T, S)> {
		let mut held = self.heap.into_vec();

		// Ascending in heap order is best first.
		held.sort_unstable();

		held.into_iter().map(|entry| (entry.item, entry.score)).collect()
	}
}

/// Heap slot. "Greater" means "ranks worse" so the max-heap root is the eviction candidate.
#[derive(Debug)]
struct Held<T, S> {
	score: S,
	seq: u64,
	item: T,
}
impl<T, S> PartialEq for Held<T, S>
where
	S: PartialOrd,
{
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}
impl<T, S> Eq for Held<T, S> where S: PartialOrd {}
impl<T, S> PartialOrd for Held<T, S>
where
	S: PartialOrd,
{
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl<T, S> Ord for Held<T, S>
where
	S: PartialOrd,
{
	fn cmp(&self, other: &Self) -> Ordering {
		// Unordered scores (NaN) count as equal and fall back to offer order.
		other
			.score
			.partial_cmp(&self.score)
			.unwrap_or(Ordering::Equal)
			.then_with(|| self.seq.cmp(&other.seq))
	}
}
