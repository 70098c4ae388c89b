use std::{
	num::NonZeroUsize,
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use fave_domain::ScoreModel;
use fave_service::{RankingCache, StorePolicy};
use fave_storage::memory::MemoryStore;

use super::{FlakySnapshots, add, assert_close, service_over, test_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_reads_prime_once() {
	let snapshots = Arc::new(FlakySnapshots {
		delay: Duration::from_millis(50),
		..FlakySnapshots::default()
	});
	let policy = StorePolicy::from_config(&test_config().storage);
	let capacity = NonZeroUsize::new(100).expect("Non-zero capacity.");
	let cache = Arc::new(RankingCache::with_limits(
		snapshots.clone(),
		policy,
		ScoreModel::default(),
		capacity,
		16,
	));
	let mut handles = Vec::new();

	for _ in 0..8 {
		let cache = Arc::clone(&cache);

		handles.push(tokio::spawn(async move { cache.top_k("rock").await }));
	}

	for handle in handles {
		let top = handle.await.expect("Task must not panic.").expect("Top-K must load.");

		assert!(top.is_empty());
	}

	assert_eq!(snapshots.gets.load(Ordering::SeqCst), 1);
	assert_eq!(cache.stats().misses, 1);
	assert_eq!(cache.stats().hits, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_from_many_users_all_count() {
	let store = Arc::new(MemoryStore::new());
	let service = Arc::new(service_over(test_config(), store.clone(), store));
	let mut handles = Vec::new();

	for idx in 0..20 {
		let service = Arc::clone(&service);

		handles.push(tokio::spawn(async move {
			add(&service, &format!("user-{idx}"), "rock", "anthem").await
		}));
	}

	for handle in handles {
		handle.await.expect("Task must not panic.").expect("Add must succeed.");
	}

	assert_close(
		service.get_global_score("rock", "anthem").await.expect("Score must load."),
		20.0 * 111.0 / 11.0,
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_edits_of_one_list_keep_every_committed_item() {
	let store = Arc::new(MemoryStore::new());
	let mut cfg = test_config();

	// Enough reloads for every writer to eventually win its compare-and-swap.
	cfg.storage.max_retries = 64;

	let service = Arc::new(service_over(cfg, store.clone(), store));
	let mut handles = Vec::new();

	for idx in 0..8 {
		let service = Arc::clone(&service);

		handles.push(tokio::spawn(async move {
			add(&service, "shared", "rock", &format!("s{idx}")).await
		}));
	}

	for handle in handles {
		handle.await.expect("Task must not panic.").expect("Add must succeed.");
	}

	let list = service.get_personal_list("shared", "rock").await.expect("List must load.");

	assert_eq!(list.entries.len(), 8);
	assert_eq!(list.version, 8);

	for entry in &list.entries {
		let score =
			service.get_global_score("rock", &entry.item.id).await.expect("Score must load.");

		assert_close(score, service.model.contribution_for_position(entry.position));
	}
}
