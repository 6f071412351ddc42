use live_player_types::SourceFormat;

/// Failures that stop a setup outright. These are shown to the user and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
	#[error("no stream lines configured")]
	NoLines,
	#[error("no stream selected")]
	NoSelection,
	#[error("browser cannot play {format} source {url} and no usable fallback is configured")]
	UnsupportedFormat { url: String, format: SourceFormat },
	#[error("engine failed: {0}")]
	Engine(String),
}
