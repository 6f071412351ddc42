use web_sys::HtmlVideoElement;

use super::{autoplay, detach_source, watch_element};
use crate::health::{DecoderEngine, EngineEventSender, SetupError};
use crate::player::util::Holder;

/// Lets the media element play the url itself. Used for progressive files and for
/// hls on browsers that play it natively.
pub struct NativeEngine {
	video: HtmlVideoElement,
	_video_events: Holder<HtmlVideoElement>,
	loaded: bool,
}

impl NativeEngine {
	pub fn new(video: HtmlVideoElement, events: EngineEventSender) -> Self {
		Self {
			_video_events: watch_element(video.clone(), &events, true),
			video,
			loaded: false,
		}
	}
}

impl DecoderEngine for NativeEngine {
	fn load(&mut self, url: &str) -> Result<(), SetupError> {
		self.video.set_src(url);
		self.loaded = true;
		autoplay(&self.video);
		Ok(())
	}

	fn stop_load(&mut self) {
		self.destroy();
	}

	fn destroy(&mut self) {
		if std::mem::take(&mut self.loaded) {
			detach_source(&self.video);
		}
	}
}

impl Drop for NativeEngine {
	fn drop(&mut self) {
		self.destroy();
	}
}
