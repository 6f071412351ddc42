use live_player_types::SourceFormat;
use tokio::sync::mpsc;

use super::error::SetupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	Network,
	Media,
	ManifestLoad,
	BufferStalled,
	Other,
}

/// An error reported by a decoder engine, translated out of the library's own vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
	pub kind: ErrorKind,
	/// The engine gave up on its own internal retries.
	pub fatal: bool,
	pub http_status: Option<u16>,
	pub detail: String,
}

impl EngineError {
	pub fn new(kind: ErrorKind, fatal: bool) -> Self {
		Self {
			kind,
			fatal,
			http_status: None,
			detail: String::new(),
		}
	}

	pub fn with_status(mut self, status: Option<u16>) -> Self {
		self.http_status = status;
		self
	}

	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = detail.into();
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
	Error(EngineError),
	/// The engine reached the server and parsed the manifest or metadata.
	Connected,
	/// Playback visibly resumed.
	Playing,
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// A black box player for one source format.
pub trait DecoderEngine {
	fn load(&mut self, url: &str) -> Result<(), SetupError>;

	fn stop_load(&mut self);

	fn destroy(&mut self);

	/// The media playlist the engine is actually reading, which can differ from the
	/// loaded url once a variant was selected out of a master playlist.
	fn active_media_playlist(&self) -> Option<String> {
		None
	}
}

pub trait EngineFactory {
	fn supports(&self, format: SourceFormat) -> bool;

	fn create(&self, format: SourceFormat, events: EngineEventSender) -> Result<Box<dyn DecoderEngine>, SetupError>;
}
