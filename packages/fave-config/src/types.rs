use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	/// Upper bound for a single durable call, in milliseconds.
	pub timeout_ms: u64,
	/// Attempts after the first one, for both timeouts and optimistic-concurrency conflicts.
	pub max_retries: u32,
	pub retry_backoff_ms: u64,
	/// Personal entries fetched per page during a rebuild scan.
	pub scan_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Scoring constants. Every process sharing one deployment must agree on these, otherwise
/// incremental updates and rebuild output drift apart.
#[derive(Debug, Clone, Deserialize)]
pub struct Ranking {
	#[serde(default = "default_max_faves")]
	pub max_faves: u32,
	#[serde(default = "default_position_divisor")]
	pub position_divisor: f64,
	#[serde(default = "default_position_offset")]
	pub position_offset: f64,
	#[serde(default = "default_reorder_scale")]
	pub reorder_scale: f64,
	#[serde(default = "default_max_annotation_chars")]
	pub max_annotation_chars: u32,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			max_faves: default_max_faves(),
			position_divisor: default_position_divisor(),
			position_offset: default_position_offset(),
			reorder_scale: default_reorder_scale(),
			max_annotation_chars: default_max_annotation_chars(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	/// Primed list-names kept in memory before the least recently used one is dropped.
	#[serde(default = "default_cache_max_lists")]
	pub max_lists: u32,
}
impl Default for Cache {
	fn default() -> Self {
		Self { max_lists: default_cache_max_lists() }
	}
}

fn default_max_faves() -> u32 {
	100
}

fn default_position_divisor() -> f64 {
	11.0
}

fn default_position_offset() -> f64 {
	111.0 / 11.0
}

fn default_reorder_scale() -> f64 {
	1.0 / 11.0
}

fn default_max_annotation_chars() -> u32 {
	200
}

fn default_cache_max_lists() -> u32 {
	1_024
}
