use fave_config::Ranking;

/// Maps personal-list positions to global score contributions.
///
/// Contributions fall linearly with position, so adjacent positions always differ by
/// `1 / divisor` and a reorder can be scored from the two positions alone.
///
/// Every value the model produces is a whole number of points, one point being `1 / divisor`.
/// Totals kept in points are exact, so two items with the same contributions compare equal no
/// matter which order their deltas arrived in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreModel {
	divisor: f64,
	offset_points: i64,
	reorder_points: i64,
}
impl ScoreModel {
	/// `offset` and `reorder_scale` are snapped to the nearest whole point.
	pub fn new(divisor: f64, offset: f64, reorder_scale: f64) -> Self {
		Self {
			divisor,
			offset_points: (offset * divisor).round() as i64,
			reorder_points: (reorder_scale * divisor).round() as i64,
		}
	}

	pub fn from_config(cfg: &Ranking) -> Self {
		Self::new(cfg.position_divisor, cfg.position_offset, cfg.reorder_scale)
	}

	pub fn contribution_for_position(&self, position: usize) -> f64 {
		self.to_score(self.contribution_points(position))
	}

	/// Signed change for an item moved from `old_position` to `new_position`. Moving up is
	/// positive.
	pub fn delta_for_reorder(&self, old_position: usize, new_position: usize) -> f64 {
		self.to_score(self.reorder_points(old_position, new_position))
	}

	pub fn contribution_points(&self, position: usize) -> i64 {
		self.offset_points - position as i64
	}

	pub fn reorder_points(&self, old_position: usize, new_position: usize) -> i64 {
		(old_position as i64 - new_position as i64) * self.reorder_points
	}

	pub fn to_score(&self, points: i64) -> f64 {
		points as f64 / self.divisor
	}

	/// Nearest whole point for a score. Exact for any score this model produced.
	pub fn to_points(&self, score: f64) -> i64 {
		(score * self.divisor).round() as i64
	}
}
impl Default for ScoreModel {
	fn default() -> Self {
		Self::new(11.0, 111.0 / 11.0, 1.0 / 11.0)
	}
}
