use fave_service::{Error, MoveItemRequest, RemoveItemRequest, SetAnnotationRequest};
use fave_storage::PersonalListStore;

use super::{add, memory_service};

#[tokio::test]
async fn full_list_rejects_the_next_item() {
	let (_, service) = memory_service();
	let max = service.cfg.ranking.max_faves as usize;

	for idx in 0..max {
		add(&service, "u1", "rock", &format!("s{idx}")).await.expect("Add must succeed.");
	}

	let err = add(&service, "u1", "rock", "one-too-many").await.expect_err("Add must fail.");

	assert!(matches!(err, Error::ListFull { max: 100 }), "Unexpected error: {err:?}");

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");

	assert_eq!(list.entries.len(), max);
	assert_eq!(service.get_global_score("rock", "one-too-many").await.expect("Score must load."), 0.0);
}

#[tokio::test]
async fn duplicate_item_is_rejected() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "s1").await.expect("Add must succeed.");

	let err = add(&service, "u1", "rock", "s1").await.expect_err("Duplicate must fail.");

	assert!(matches!(err, Error::DuplicateItem { ref item_id } if item_id == "s1"));

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");

	assert_eq!(list.entries.len(), 1);
}

#[tokio::test]
async fn missing_items_are_not_found() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "s1").await.expect("Add must succeed.");

	let err = service
		.remove_item(RemoveItemRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "ghost".to_string(),
		})
		.await
		.expect_err("Remove must fail.");

	assert!(matches!(err, Error::NotFound { .. }));

	let err = service
		.move_item(MoveItemRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "ghost".to_string(),
			new_position: 0,
		})
		.await
		.expect_err("Move must fail.");

	assert!(matches!(err, Error::NotFound { .. }));

	let err = service
		.set_annotation(SetAnnotationRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "ghost".to_string(),
			annotation: Some("Nope.".to_string()),
		})
		.await
		.expect_err("Annotate must fail.");

	assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn out_of_range_move_leaves_the_list_untouched() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "a").await.expect("Add must succeed.");
	add(&service, "u1", "rock", "b").await.expect("Add must succeed.");

	let err = service
		.move_item(MoveItemRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "a".to_string(),
			new_position: 2,
		})
		.await
		.expect_err("Move must fail.");

	assert!(matches!(err, Error::IndexOutOfRange { index: 2, len: 2 }));
	assert!(!err.is_retryable());

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");
	let ids: Vec<&str> = list.entries.iter().map(|entry| entry.item.id.as_str()).collect();

	assert_eq!(ids, vec!["a", "b"]);
	assert_eq!(list.version, 2);
}

#[tokio::test]
async fn anonymous_mutations_fail_before_any_write() {
	let (store, service) = memory_service();
	let err = add(&service, "  ", "rock", "s1").await.expect_err("Add must fail.");

	assert!(matches!(err, Error::NotLoggedIn));

	let err = service
		.remove_item(RemoveItemRequest {
			user_id: String::new(),
			list_name: "rock".to_string(),
			item_id: "s1".to_string(),
		})
		.await
		.expect_err("Remove must fail.");

	assert!(matches!(err, Error::NotLoggedIn));
	assert!(store.list_names().await.expect("Listing must succeed.").is_empty());
	assert_eq!(service.cache.stats().misses, 0);
}

#[tokio::test]
async fn blank_names_are_invalid_requests() {
	let (_, service) = memory_service();
	let err = add(&service, "u1", " ", "s1").await.expect_err("Blank list name must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let err = add(&service, "u1", "rock", "").await.expect_err("Blank item id must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let err = service.get_global_top_k("").await.expect_err("Blank list name must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn overlong_annotation_is_rejected() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "s1").await.expect("Add must succeed.");

	let limit = service.cfg.ranking.max_annotation_chars as usize;
	let err = service
		.set_annotation(SetAnnotationRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "s1".to_string(),
			annotation: Some("x".repeat(limit + 1)),
		})
		.await
		.expect_err("Annotate must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");

	assert_eq!(list.entries[0].annotation, None);
}
