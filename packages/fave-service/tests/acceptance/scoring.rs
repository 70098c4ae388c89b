use fave_service::{MoveItemRequest, RemoveItemRequest, SetAnnotationRequest};

use super::{add, assert_close, memory_service, service_over, test_config};

const FIRST: f64 = 111.0 / 11.0;
const SECOND: f64 = 10.0;
const THIRD: f64 = 109.0 / 11.0;

fn remove_request(user_id: &str, list_name: &str, item_id: &str) -> RemoveItemRequest {
	RemoveItemRequest {
		user_id: user_id.to_string(),
		list_name: list_name.to_string(),
		item_id: item_id.to_string(),
	}
}

fn move_request(user_id: &str, item_id: &str, new_position: usize) -> MoveItemRequest {
	MoveItemRequest {
		user_id: user_id.to_string(),
		list_name: "rock".to_string(),
		item_id: item_id.to_string(),
		new_position,
	}
}

#[tokio::test]
async fn two_users_sum_and_removal_withdraws() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "s1").await.expect("First add must succeed.");
	add(&service, "u2", "rock", "s1").await.expect("Second add must succeed.");

	let top = service.get_global_top_k("rock").await.expect("Top-K must load.");

	assert_eq!(top.len(), 1);
	assert_eq!(top[0].item.id, "s1");
	assert_close(top[0].score, 2.0 * FIRST);
	assert!((top[0].score - 20.18).abs() < 0.01);

	service.remove_item(remove_request("u1", "rock", "s1")).await.expect("Remove must succeed.");

	assert_close(service.get_global_score("rock", "s1").await.expect("Score must load."), FIRST);
}

#[tokio::test]
async fn appended_items_score_by_position() {
	let (_, service) = memory_service();

	for (expected_position, id) in ["a", "b", "c"].into_iter().enumerate() {
		let added = add(&service, "u1", "rock", id).await.expect("Add must succeed.");

		assert_eq!(added.position, expected_position);
	}

	let top = service.get_global_top_k("rock").await.expect("Top-K must load.");
	let ids: Vec<&str> = top.iter().map(|ranked| ranked.item.id.as_str()).collect();

	assert_eq!(ids, vec!["a", "b", "c"]);
	assert_close(top[0].score, FIRST);
	assert_close(top[1].score, SECOND);
	assert_close(top[2].score, THIRD);
}

#[tokio::test]
async fn removal_credits_entries_that_move_up() {
	let (_, service) = memory_service();

	for id in ["a", "b", "c"] {
		add(&service, "u1", "rock", id).await.expect("Add must succeed.");
	}

	let removed = service
		.remove_item(remove_request("u1", "rock", "a"))
		.await
		.expect("Remove must succeed.");

	assert_eq!(removed.removed.id, "a");

	let top = service.get_global_top_k("rock").await.expect("Top-K must load.");
	let ids: Vec<&str> = top.iter().map(|ranked| ranked.item.id.as_str()).collect();

	assert_eq!(ids, vec!["b", "c"]);
	assert_close(top[0].score, FIRST);
	assert_close(top[1].score, SECOND);
	assert_eq!(service.get_global_score("rock", "a").await.expect("Score must load."), 0.0);

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");
	let positions: Vec<usize> = list.entries.iter().map(|entry| entry.position).collect();

	assert_eq!(positions, vec![0, 1]);
}

#[tokio::test]
async fn moves_rescore_the_moved_item_and_the_shifted_ones() {
	let (_, service) = memory_service();

	for id in ["a", "b", "c", "d"] {
		add(&service, "u1", "rock", id).await.expect("Add must succeed.");
	}

	let moved = service.move_item(move_request("u1", "d", 0)).await.expect("Move up must succeed.");

	assert_eq!((moved.from, moved.to), (3, 0));

	let expected = ["d", "a", "b", "c"];

	for (position, id) in expected.into_iter().enumerate() {
		let score = service.get_global_score("rock", id).await.expect("Score must load.");

		assert_close(score, service.model.contribution_for_position(position));
	}

	service.move_item(move_request("u1", "d", 2)).await.expect("Move down must succeed.");

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");
	let ids: Vec<&str> = list.entries.iter().map(|entry| entry.item.id.as_str()).collect();

	assert_eq!(ids, vec!["a", "b", "d", "c"]);

	for (position, id) in ids.into_iter().enumerate() {
		let score = service.get_global_score("rock", id).await.expect("Score must load.");

		assert_close(score, service.model.contribution_for_position(position));
	}
}

#[tokio::test]
async fn moving_to_the_current_position_changes_nothing() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "a").await.expect("Add must succeed.");

	let before = add(&service, "u1", "rock", "b").await.expect("Add must succeed.");
	let moved = service.move_item(move_request("u1", "b", 1)).await.expect("Move must succeed.");

	assert_eq!(moved.version, before.version);
	assert_close(service.get_global_score("rock", "b").await.expect("Score must load."), SECOND);
}

#[tokio::test]
async fn list_names_are_normalized_on_every_path() {
	let (store, service) = memory_service();

	add(&service, "u1", "  Rock ", "s1").await.expect("Add must succeed.");

	let list = service.get_personal_list("u1", "ROCK").await.expect("List must load.");

	assert_eq!(list.list_name, "rock");
	assert_eq!(list.entries.len(), 1);
	assert_eq!(
		fave_storage::PersonalListStore::list_names(store.as_ref())
			.await
			.expect("Listing must succeed."),
		vec!["rock".to_string()]
	);
	assert_close(service.get_global_score("rock", "s1").await.expect("Score must load."), FIRST);
}

#[tokio::test]
async fn annotations_round_trip_without_touching_scores() {
	let (_, service) = memory_service();

	add(&service, "u1", "rock", "s1").await.expect("Add must succeed.");

	let set = service
		.set_annotation(SetAnnotationRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "s1".to_string(),
			annotation: Some("  That chorus.  ".to_string()),
		})
		.await
		.expect("Annotate must succeed.");

	assert_eq!(set.annotation.as_deref(), Some("That chorus."));

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");

	assert_eq!(list.entries[0].annotation.as_deref(), Some("That chorus."));
	assert_close(service.get_global_score("rock", "s1").await.expect("Score must load."), FIRST);

	let cleared = service
		.set_annotation(SetAnnotationRequest {
			user_id: "u1".to_string(),
			list_name: "rock".to_string(),
			item_id: "s1".to_string(),
			annotation: Some("   ".to_string()),
		})
		.await
		.expect("Clearing must succeed.");

	assert_eq!(cleared.annotation, None);

	let list = service.get_personal_list("u1", "rock").await.expect("List must load.");

	assert_eq!(list.entries[0].annotation, None);
}

#[tokio::test]
async fn restarted_service_reads_scores_from_the_snapshot() {
	let (store, service) = memory_service();

	add(&service, "u1", "rock", "s1").await.expect("Add must succeed.");
	add(&service, "u2", "rock", "s1").await.expect("Add must succeed.");
	service.rebuild_global_ranking("rock").await.expect("Rebuild must succeed.");

	let restarted = service_over(test_config(), store.clone(), store.clone());

	assert_close(
		restarted.get_global_score("rock", "s1").await.expect("Score must load."),
		2.0 * FIRST,
	);
	assert_eq!(restarted.cache.stats().misses, 1);
}
