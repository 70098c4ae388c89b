use std::{
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use fave_service::Error;
use fave_storage::{PersonalListStore, memory::MemoryStore};

use super::{
	ConflictingLists, FlakySnapshots, SlowLists, add, assert_close, service_over, test_config,
};

#[tokio::test]
async fn snapshot_outage_fails_reads_but_commits_writes() {
	let lists = Arc::new(MemoryStore::new());
	let snapshots = Arc::new(FlakySnapshots::default());
	let service = service_over(test_config(), lists.clone(), snapshots.clone());

	snapshots.failing.store(true, Ordering::SeqCst);

	// The personal list is the source of truth; a cache that cannot prime does not block it.
	add(&service, "u1", "rock", "s1").await.expect("Add must commit while snapshots are down.");

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");

	assert_eq!(list.entries.len(), 1);

	let err = service.get_global_top_k("rock").await.expect_err("Top-K must fail.");

	assert!(matches!(err, Error::CacheUnavailable { .. }), "Unexpected error: {err:?}");
	assert!(err.is_retryable());

	let err = service.rebuild_global_ranking("rock").await.expect_err("Rebuild must fail.");

	assert!(matches!(err, Error::CacheUnavailable { .. }));

	snapshots.failing.store(false, Ordering::SeqCst);
	service.rebuild_global_ranking("rock").await.expect("Rebuild must succeed once recovered.");

	let top = service.get_global_top_k("rock").await.expect("Top-K must load.");

	assert_eq!(top.len(), 1);
	assert_close(top[0].score, 111.0 / 11.0);
}

#[tokio::test]
async fn failed_priming_is_retried_on_the_next_read() {
	let lists = Arc::new(MemoryStore::new());
	let snapshots = Arc::new(FlakySnapshots::default());
	let mut cfg = test_config();

	cfg.storage.max_retries = 0;

	let service = service_over(cfg, lists, snapshots.clone());

	snapshots.failing.store(true, Ordering::SeqCst);
	service.get_global_top_k("rock").await.expect_err("Top-K must fail.");
	snapshots.failing.store(false, Ordering::SeqCst);

	assert!(service.get_global_top_k("rock").await.expect("Top-K must load.").is_empty());
	assert_eq!(snapshots.gets.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn persistent_conflicts_surface_as_concurrent_modification() {
	let lists = Arc::new(ConflictingLists::default());
	let snapshots = Arc::new(MemoryStore::new());
	let service = service_over(test_config(), lists.clone(), snapshots);

	lists.conflicts_left.store(usize::MAX, Ordering::SeqCst);

	let err = add(&service, "u1", "rock", "s1").await.expect_err("Add must fail.");

	assert!(matches!(err, Error::ConcurrentModification { .. }), "Unexpected error: {err:?}");
	assert!(err.is_retryable());
	// One first attempt plus the configured retries.
	assert_eq!(
		lists.saves.load(Ordering::SeqCst),
		service.cfg.storage.max_retries as usize + 1
	);
	assert_eq!(service.get_global_score("rock", "s1").await.expect("Score must load."), 0.0);
}

#[tokio::test]
async fn a_single_conflict_is_absorbed_by_reloading() {
	let lists = Arc::new(ConflictingLists::default());
	let snapshots = Arc::new(MemoryStore::new());
	let service = service_over(test_config(), lists.clone(), snapshots);

	lists.conflicts_left.store(1, Ordering::SeqCst);

	let added = add(&service, "u1", "rock", "s1").await.expect("Add must succeed.");

	assert_eq!(added.version, 1);
	assert_eq!(lists.saves.load(Ordering::SeqCst), 2);
	// Deltas are applied once, for the attempt that committed.
	assert_close(
		service.get_global_score("rock", "s1").await.expect("Score must load."),
		111.0 / 11.0,
	);
}

#[tokio::test]
async fn slow_personal_store_times_out_as_storage_error() {
	let lists = Arc::new(SlowLists { delay: Duration::from_millis(300), ..SlowLists::default() });
	let snapshots = Arc::new(MemoryStore::new());
	let mut cfg = test_config();

	cfg.storage.timeout_ms = 20;
	cfg.storage.max_retries = 1;

	let service = service_over(cfg, lists.clone(), snapshots);
	let err = add(&service, "u1", "rock", "s1").await.expect_err("Add must time out.");

	assert!(matches!(err, Error::Storage { .. }), "Unexpected error: {err:?}");
	assert!(err.is_retryable());
	assert_eq!(lists.loads.load(Ordering::SeqCst), 2);
	assert!(lists.inner.list_names().await.expect("Listing must succeed.").is_empty());
}
