use std::sync::OnceLock;

use regex::Regex;

/// A media segment reference followed by a query string. The query runs until
/// whitespace or a closing quote, so `URI="seg.m4s?x=1"` attributes match as well.
fn segment_query() -> &'static Regex {
	static SEGMENT_QUERY: OnceLock<Regex> = OnceLock::new();

	SEGMENT_QUERY.get_or_init(|| {
		Regex::new(r#"(?i)(\.(?:ts|m4s|mp4|fmp4|aac|m4a|mp3|cmfv|cmfa|vtt|webvtt))\?[^"\s]*"#)
			.expect("segment query pattern is valid")
	})
}

/// Reduces a media playlist to a form that only changes when its segments change.
///
/// Caches in front of the origin are free to rewrite cache busting query parameters
/// on an otherwise identical playlist, so comparing raw text would report a frozen
/// stream as advancing. Only the query strings of segment references are removed,
/// nothing else about the text is touched.
pub fn normalize(text: Option<&str>) -> Option<String> {
	let text = text?;

	let normalized = text
		.split_inclusive('\n')
		.map(|line| segment_query().replace_all(line, "$1"))
		.collect();

	Some(normalized)
}
