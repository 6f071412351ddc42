use url::Url;

/// A playlist listing segments is a media playlist, anything else is treated as a master.
pub fn is_media_playlist(text: &str) -> bool {
	text.lines().any(|line| line.trim_start().starts_with("#EXTINF"))
}

/// The first uri line of a master playlist, which is the variant the poller watches.
pub fn media_playlist_reference(text: &str) -> Option<&str> {
	text.lines()
		.map(str::trim)
		.find(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Resolves `reference` the way a browser would resolve it against the playlist at `base`.
pub fn resolve_uri(base: &str, reference: &str) -> String {
	if let Ok(url) = Url::parse(reference) {
		return url.to_string();
	}

	if let Ok(joined) = Url::parse(base).and_then(|base| base.join(reference)) {
		return joined.to_string();
	}

	// Page relative bases cannot be parsed without a document url, so join the paths by hand.
	if reference.starts_with('/') {
		return reference.to_string();
	}

	let base = base.split(['?', '#']).next().unwrap_or_default();
	match base.rfind('/') {
		Some(idx) => format!("{}{}", &base[..=idx], reference),
		None => reference.to_string(),
	}
}
