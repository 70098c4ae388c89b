use crate::{Error, Result};
use fave_service::{LeaderboardService, RebuildReport};

#[derive(Debug, Default)]
pub struct RebuildOutcome {
	pub reports: Vec<RebuildReport>,
	pub failed: Vec<String>,
}
impl RebuildOutcome {
	/// Fails when any list could not be rebuilt.
	pub fn into_result(self) -> Result<Vec<RebuildReport>> {
		if self.failed.is_empty() {
			return Ok(self.reports);
		}

		Err(Error::Incomplete {
			failed: self.failed.len(),
			total: self.failed.len() + self.reports.len(),
		})
	}
}

/// Rebuilds `names`, or every list-name the personal store knows when `names` is empty. One
/// failing list is logged and skipped so the rest still get fresh snapshots.
pub async fn rebuild_lists(
	service: &LeaderboardService,
	names: &[String],
) -> Result<RebuildOutcome> {
	let names = if names.is_empty() { service.list_names().await? } else { names.to_vec() };
	let mut outcome = RebuildOutcome::default();

	tracing::info!(lists = names.len(), "Starting global ranking rebuild.");

	for name in names {
		match service.rebuild_global_ranking(&name).await {
			Ok(report) => outcome.reports.push(report),
			Err(err) => {
				tracing::error!(
					list_name = name.as_str(),
					error = %err,
					"Global ranking rebuild failed."
				);

				outcome.failed.push(name);
			},
		}
	}

	Ok(outcome)
}
