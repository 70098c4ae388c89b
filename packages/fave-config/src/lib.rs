mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, Config, Postgres, Ranking, Service, Storage};

use std::{fs, path::Path};

const WHOLE_STEP_TOLERANCE: f64 = 1e-6;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw).map_err(|err| Error::ParseInline { source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.scan_page_size == 0 {
		return Err(Error::Validation {
			message: "storage.scan_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.ranking.max_faves == 0 {
		return Err(Error::Validation {
			message: "ranking.max_faves must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("ranking.position_divisor", cfg.ranking.position_divisor),
		("ranking.position_offset", cfg.ranking.position_offset),
		("ranking.reorder_scale", cfg.ranking.reorder_scale),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if value <= 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	// Scores are counted in whole steps of 1 / position_divisor.
	for (label, value) in [
		("ranking.position_offset", cfg.ranking.position_offset),
		("ranking.reorder_scale", cfg.ranking.reorder_scale),
	] {
		let steps = value * cfg.ranking.position_divisor;

		if (steps - steps.round()).abs() > WHOLE_STEP_TOLERANCE {
			return Err(Error::Validation {
				message: format!(
					"{label} must be a whole multiple of 1 / ranking.position_divisor, got {steps} steps."
				),
			});
		}
	}

	let deepest = cfg.ranking.position_offset
		- f64::from(cfg.ranking.max_faves - 1) / cfg.ranking.position_divisor;

	if deepest <= 0.0 {
		return Err(Error::Validation {
			message: "ranking.position_offset must keep the contribution of the last allowed position above zero."
				.to_string(),
		});
	}
	if cfg.ranking.max_annotation_chars == 0 {
		return Err(Error::Validation {
			message: "ranking.max_annotation_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.max_lists == 0 {
		return Err(Error::Validation {
			message: "cache.max_lists must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.storage.postgres.dsn = cfg.storage.postgres.dsn.trim().to_string();
}
