use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
	Result,
	models::{GlobalSnapshot, PersonalList, ScanCursor, ScanPage},
	queries, schema,
	store::{BoxFuture, PersonalListStore, SnapshotStore},
};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &fave_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let lock_id: i64 = 4_611_100;
		// Transaction-scoped, so concurrent bootstraps serialize and the lock ends with the commit.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in schema::render_schema().split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
impl PersonalListStore for Db {
	fn load<'a>(
		&'a self,
		user_id: &'a str,
		list_name: &'a str,
	) -> BoxFuture<'a, Result<Option<PersonalList>>> {
		Box::pin(queries::load_list(self, user_id, list_name))
	}

	fn save<'a>(&'a self, list: &'a PersonalList) -> BoxFuture<'a, Result<PersonalList>> {
		Box::pin(queries::save_list(self, list))
	}

	fn scan<'a>(
		&'a self,
		list_name: &'a str,
		after: Option<&'a ScanCursor>,
		limit: usize,
	) -> BoxFuture<'a, Result<ScanPage>> {
		Box::pin(queries::scan_entries(self, list_name, after, limit))
	}

	fn list_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(queries::list_names(self))
	}
}
impl SnapshotStore for Db {
	fn get<'a>(&'a self, list_name: &'a str) -> BoxFuture<'a, Result<Option<GlobalSnapshot>>> {
		Box::pin(queries::get_snapshot(self, list_name))
	}

	fn put<'a>(&'a self, snapshot: &'a GlobalSnapshot) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::put_snapshot(self, snapshot))
	}
}
