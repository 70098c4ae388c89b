/// Canonical form of a list-name (hashtag). Lookups are case-insensitive, so every store and
/// cache key goes through here first. Returns `None` for a blank name.
pub fn normalize(raw: &str) -> Option<String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.to_lowercase())
}
