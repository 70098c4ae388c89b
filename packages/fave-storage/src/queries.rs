use std::collections::HashMap;

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
	Error, Result,
	db::Db,
	models::{
		GlobalSnapshot, Item, PersonalEntry, PersonalList, RankedItem, ScanCursor, ScanPage,
		ScannedEntry,
	},
};

#[derive(sqlx::FromRow)]
struct ListRow {
	version: i64,
	position: Option<i32>,
	item_id: Option<String>,
	title: Option<String>,
	artist: Option<String>,
	annotation: Option<String>,
	first_seen: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
	user_id: String,
	position: i32,
	item_id: String,
	title: String,
	artist: String,
	annotation: Option<String>,
	first_seen: i64,
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
	rebuilt_at: OffsetDateTime,
	item_id: Option<String>,
	title: Option<String>,
	artist: Option<String>,
	score: Option<f64>,
	first_seen: Option<i64>,
}

pub async fn load_list(db: &Db, user_id: &str, list_name: &str) -> Result<Option<PersonalList>> {
	// One statement, so the version and the entries come from the same snapshot.
	let rows: Vec<ListRow> = sqlx::query_as(
		"\
SELECT
	l.version,
	e.position,
	e.item_id,
	e.title,
	e.artist,
	e.annotation,
	e.first_seen
FROM fave_lists l
LEFT JOIN fave_entries e
	ON e.user_id = l.user_id AND e.list_name = l.list_name
WHERE l.user_id = $1 AND l.list_name = $2
ORDER BY e.position",
	)
	.bind(user_id)
	.bind(list_name)
	.fetch_all(&db.pool)
	.await?;
	let Some(version) = rows.first().map(|row| row.version) else {
		return Ok(None);
	};
	let mut list = PersonalList::empty(user_id, list_name);

	list.version = version;

	for row in rows {
		let (Some(position), Some(item_id), Some(title), Some(artist), Some(first_seen)) =
			(row.position, row.item_id, row.title, row.artist, row.first_seen)
		else {
			continue;
		};

		list.entries.push(PersonalEntry {
			item: Item { id: item_id, title, artist },
			position: to_position(position)?,
			annotation: row.annotation,
			first_seen,
		});
	}

	Ok(Some(list))
}

pub async fn save_list(db: &Db, list: &PersonalList) -> Result<PersonalList> {
	if i32::try_from(list.entries.len()).is_err() {
		return Err(Error::InvalidArgument("Personal list is too long to store.".to_string()));
	}

	let now = OffsetDateTime::now_utc();
	let mut tx = db.pool.begin().await?;
	let claimed = if list.version == 0 {
		sqlx::query(
			"\
INSERT INTO fave_lists (user_id, list_name, version, updated_at)
VALUES ($1, $2, 1, $3)
ON CONFLICT (user_id, list_name) DO NOTHING",
		)
		.bind(list.user_id.as_str())
		.bind(list.list_name.as_str())
		.bind(now)
		.execute(&mut *tx)
		.await?
		.rows_affected()
	} else {
		sqlx::query(
			"\
UPDATE fave_lists
SET version = version + 1, updated_at = $3
WHERE user_id = $1 AND list_name = $2 AND version = $4",
		)
		.bind(list.user_id.as_str())
		.bind(list.list_name.as_str())
		.bind(now)
		.bind(list.version)
		.execute(&mut *tx)
		.await?
		.rows_affected()
	};

	if claimed == 0 {
		return Err(Error::Conflict(format!(
			"List {}:{} changed since version {}.",
			list.user_id, list.list_name, list.version
		)));
	}

	sqlx::query("DELETE FROM fave_entries WHERE user_id = $1 AND list_name = $2")
		.bind(list.user_id.as_str())
		.bind(list.list_name.as_str())
		.execute(&mut *tx)
		.await?;

	let mut saved = list.clone();

	saved.version = list.version + 1;
	saved.renumber();

	if !saved.entries.is_empty() {
		let item_ids: Vec<String> = saved.entries.iter().map(|entry| entry.item.id.clone()).collect();

		// New items are registered in list order, so one save hands out ascending keys.
		sqlx::query(
			"INSERT INTO fave_items (list_name, item_id)
SELECT $1, t.item_id
FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t (item_id, ord)
ORDER BY t.ord
ON CONFLICT (list_name, item_id) DO NOTHING",
		)
		.bind(list.list_name.as_str())
		.bind(item_ids.as_slice())
		.execute(&mut *tx)
		.await?;

		let keys: HashMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
			"SELECT item_id, first_seen
FROM fave_items
WHERE list_name = $1 AND item_id = ANY($2::TEXT[])",
		)
		.bind(list.list_name.as_str())
		.bind(item_ids.as_slice())
		.fetch_all(&mut *tx)
		.await?
		.into_iter()
		.collect();

		for entry in &mut saved.entries {
			entry.first_seen = keys.get(&entry.item.id).copied().ok_or_else(|| {
				Error::NotFound(format!("Item {} was not registered.", entry.item.id))
			})?;
		}

		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
			"INSERT INTO fave_entries (user_id, list_name, position, item_id, title, artist, annotation, first_seen) ",
		);

		builder.push_values(saved.entries.iter(), |mut row, entry| {
			row.push_bind(saved.user_id.as_str())
				.push_bind(saved.list_name.as_str())
				.push_bind(entry.position as i32)
				.push_bind(entry.item.id.as_str())
				.push_bind(entry.item.title.as_str())
				.push_bind(entry.item.artist.as_str())
				.push_bind(entry.annotation.as_deref())
				.push_bind(entry.first_seen);
		});
		builder.build().execute(&mut *tx).await?;
	}

	tx.commit().await?;

	Ok(saved)
}

pub async fn scan_entries(
	db: &Db,
	list_name: &str,
	after: Option<&ScanCursor>,
	limit: usize,
) -> Result<ScanPage> {
	if limit == 0 {
		return Err(Error::InvalidArgument("Scan limit must be greater than zero.".to_string()));
	}

	let after_position = after.map(|cursor| cursor.position as i32);
	let rows: Vec<EntryRow> = sqlx::query_as(
		"\
SELECT user_id, position, item_id, title, artist, annotation, first_seen
FROM fave_entries
WHERE list_name = $1
	AND ($2::TEXT IS NULL OR (user_id, position) > ($2::TEXT, $3::INTEGER))
ORDER BY user_id, position
LIMIT $4",
	)
	.bind(list_name)
	.bind(after.map(|cursor| cursor.user_id.as_str()))
	.bind(after_position)
	.bind(limit as i64)
	.fetch_all(&db.pool)
	.await?;
	let mut entries = Vec::with_capacity(rows.len());

	for row in rows {
		entries.push(ScannedEntry {
			user_id: row.user_id,
			entry: PersonalEntry {
				item: Item { id: row.item_id, title: row.title, artist: row.artist },
				position: to_position(row.position)?,
				annotation: row.annotation,
				first_seen: row.first_seen,
			},
		});
	}

	let next = if entries.len() == limit {
		entries.last().map(|last| ScanCursor {
			user_id: last.user_id.clone(),
			position: last.entry.position,
		})
	} else {
		None
	};

	Ok(ScanPage { entries, next })
}

pub async fn list_names(db: &Db) -> Result<Vec<String>> {
	let names: Vec<String> =
		sqlx::query_scalar("SELECT DISTINCT list_name FROM fave_lists ORDER BY list_name")
			.fetch_all(&db.pool)
			.await?;

	Ok(names)
}

pub async fn get_snapshot(db: &Db, list_name: &str) -> Result<Option<GlobalSnapshot>> {
	let rows: Vec<SnapshotRow> = sqlx::query_as(
		"\
SELECT
	s.rebuilt_at,
	e.item_id,
	e.title,
	e.artist,
	e.score,
	e.first_seen
FROM global_snapshots s
LEFT JOIN global_snapshot_entries e ON e.list_name = s.list_name
WHERE s.list_name = $1
ORDER BY e.rank",
	)
	.bind(list_name)
	.fetch_all(&db.pool)
	.await?;
	let Some(rebuilt_at) = rows.first().map(|row| row.rebuilt_at) else {
		return Ok(None);
	};
	let entries = rows
		.into_iter()
		.filter_map(|row| match (row.item_id, row.title, row.artist, row.score, row.first_seen) {
			(Some(id), Some(title), Some(artist), Some(score), Some(first_seen)) =>
				Some(RankedItem { item: Item { id, title, artist }, score, first_seen }),
			_ => None,
		})
		.collect();

	Ok(Some(GlobalSnapshot { list_name: list_name.to_string(), entries, rebuilt_at }))
}

pub async fn put_snapshot(db: &Db, snapshot: &GlobalSnapshot) -> Result<()> {
	let mut tx = db.pool.begin().await?;

	sqlx::query(
		"\
INSERT INTO global_snapshots (list_name, rebuilt_at)
VALUES ($1, $2)
ON CONFLICT (list_name) DO UPDATE SET rebuilt_at = EXCLUDED.rebuilt_at",
	)
	.bind(snapshot.list_name.as_str())
	.bind(snapshot.rebuilt_at)
	.execute(&mut *tx)
	.await?;
	sqlx::query("DELETE FROM global_snapshot_entries WHERE list_name = $1")
		.bind(snapshot.list_name.as_str())
		.execute(&mut *tx)
		.await?;

	if !snapshot.entries.is_empty() {
		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
			"INSERT INTO global_snapshot_entries (list_name, rank, item_id, title, artist, score, first_seen) ",
		);

		builder.push_values(snapshot.entries.iter().enumerate(), |mut row, (rank, ranked)| {
			row.push_bind(snapshot.list_name.as_str())
				.push_bind(rank as i32)
				.push_bind(ranked.item.id.as_str())
				.push_bind(ranked.item.title.as_str())
				.push_bind(ranked.item.artist.as_str())
				.push_bind(ranked.score)
				.push_bind(ranked.first_seen);
		});
		builder.build().execute(&mut *tx).await?;
	}

	tx.commit().await?;

	tracing::debug!(
		list_name = snapshot.list_name.as_str(),
		entries = snapshot.entries.len(),
		"Global snapshot written."
	);

	Ok(())
}

fn to_position(raw: i32) -> Result<usize> {
	usize::try_from(raw)
		.map_err(|_| Error::InvalidArgument(format!("Stored position {raw} is negative.")))
}
