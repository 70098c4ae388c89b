pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS fave_lists (
	user_id TEXT NOT NULL,
	list_name TEXT NOT NULL,
	version BIGINT NOT NULL,
	updated_at TIMESTAMPTZ NOT NULL,
	PRIMARY KEY (user_id, list_name)
);

CREATE TABLE IF NOT EXISTS fave_items (
	list_name TEXT NOT NULL,
	item_id TEXT NOT NULL,
	first_seen BIGSERIAL NOT NULL,
	PRIMARY KEY (list_name, item_id)
);

CREATE TABLE IF NOT EXISTS fave_entries (
	user_id TEXT NOT NULL,
	list_name TEXT NOT NULL,
	position INTEGER NOT NULL,
	item_id TEXT NOT NULL,
	title TEXT NOT NULL,
	artist TEXT NOT NULL,
	annotation TEXT,
	first_seen BIGINT NOT NULL,
	PRIMARY KEY (user_id, list_name, position),
	UNIQUE (user_id, list_name, item_id),
	FOREIGN KEY (user_id, list_name) REFERENCES fave_lists (user_id, list_name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS fave_entries_scan_idx
	ON fave_entries (list_name, user_id, position);

CREATE TABLE IF NOT EXISTS global_snapshots (
	list_name TEXT PRIMARY KEY,
	rebuilt_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS global_snapshot_entries (
	list_name TEXT NOT NULL REFERENCES global_snapshots (list_name) ON DELETE CASCADE,
	rank INTEGER NOT NULL,
	item_id TEXT NOT NULL,
	title TEXT NOT NULL,
	artist TEXT NOT NULL,
	score DOUBLE PRECISION NOT NULL,
	first_seen BIGINT NOT NULL,
	PRIMARY KEY (list_name, rank)
);
";

pub fn render_schema() -> &'static str {
	SCHEMA_SQL
}
