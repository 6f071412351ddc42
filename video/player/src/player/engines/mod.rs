use std::cell::RefCell;
use std::rc::Weak;

use live_player_types::SourceFormat;
use tokio::sync::mpsc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlVideoElement;

use super::errors::{ErrorCode, EventError};
use super::events::{dispatch, EventManager};
use super::util::{register_events, Holder};
use crate::health::{DecoderEngine, EngineError, EngineEvent, EngineEventSender, EngineFactory, ErrorKind, SetupError};

mod flv;
mod hls;
mod native;

pub use self::flv::map_flv_error;
pub use self::hls::{map_hls_error, HlsErrorData};

const NATIVE_HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// Creates the adapter for each source format on one video element.
pub struct BrowserEngineFactory {
	video: HtmlVideoElement,
	events: Weak<RefCell<EventManager>>,
}

impl BrowserEngineFactory {
	pub fn new(video: HtmlVideoElement, events: Weak<RefCell<EventManager>>) -> Self {
		Self { video, events }
	}

	fn native_hls(&self) -> bool {
		!self.video.can_play_type(NATIVE_HLS_MIME).is_empty()
	}
}

impl EngineFactory for BrowserEngineFactory {
	fn supports(&self, format: SourceFormat) -> bool {
		match format {
			SourceFormat::Hls => hls::is_supported() || self.native_hls(),
			SourceFormat::Flv => flv::is_supported(),
			SourceFormat::Other => true,
		}
	}

	fn create(&self, format: SourceFormat, events: EngineEventSender) -> Result<Box<dyn DecoderEngine>, SetupError> {
		let events = report_errors(self.events.clone(), events);

		let engine: Box<dyn DecoderEngine> = match format {
			SourceFormat::Hls if hls::is_supported() => Box::new(hls::HlsEngine::new(self.video.clone(), events)?),
			SourceFormat::Flv => Box::new(flv::FlvEngine::new(self.video.clone(), events)?),
			SourceFormat::Hls | SourceFormat::Other => Box::new(native::NativeEngine::new(self.video.clone(), events)),
		};

		tracing::debug!("created {} engine", format);

		Ok(engine)
	}
}

/// Surfaces every engine error to the page as an `error` event on its way to the controller.
fn report_errors(manager: Weak<RefCell<EventManager>>, controller: EngineEventSender) -> EngineEventSender {
	let (tx, mut rx) = mpsc::unbounded_channel();

	spawn_local(async move {
		// Ends once the engine and its listeners drop the sender.
		while let Some(event) = rx.recv().await {
			if let EngineEvent::Error(error) = &event {
				if let Some(manager) = manager.upgrade() {
					dispatch!(manager.borrow_mut().emit(event_error(error)));
				}
			}

			if controller.send(event).is_err() {
				break;
			}
		}
	});

	tx
}

fn event_error(error: &EngineError) -> EventError {
	let code = match error.kind {
		ErrorKind::Network | ErrorKind::ManifestLoad => ErrorCode::Network,
		ErrorKind::Media | ErrorKind::BufferStalled => ErrorCode::Media,
		ErrorKind::Other => ErrorCode::Other,
	};

	EventError::new(code, error.detail.clone(), error.fatal)
}

/// Forwards `playing` for every engine. Element errors are only forwarded for the
/// native engine, the libraries report them on their own.
fn watch_element(video: HtmlVideoElement, events: &EngineEventSender, forward_errors: bool) -> Holder<HtmlVideoElement> {
	let cleanup = register_events!(video, {
		"playing" => {
			let events = events.clone();
			move |_| {
				events.send(EngineEvent::Playing).ok();
			}
		},
		"error" => {
			let events = events.clone();
			let video = video.clone();
			move |_| {
				if !forward_errors {
					return;
				}

				let detail = video
					.error()
					.map(|err| format!("media error {}: {}", err.code(), err.message()))
					.unwrap_or_else(|| "media error".to_string());

				events.send(EngineEvent::Error(EngineError::new(ErrorKind::Media, true).with_detail(detail))).ok();
			}
		},
	});

	Holder::new(video, cleanup)
}

/// Live sources start playing as soon as they are loaded. A rejected play (autoplay
/// policy) leaves the element paused for the user to start.
fn autoplay(video: &HtmlVideoElement) {
	let Ok(promise) = video.play() else {
		return;
	};

	spawn_local(async move {
		if let Err(err) = JsFuture::from(promise).await {
			tracing::debug!("autoplay rejected: {:?}", err);
		}
	});
}

fn detach_source(video: &HtmlVideoElement) {
	video.remove_attribute("src").ok();
	video.load();
}

fn js_setup_error(err: wasm_bindgen::JsValue) -> SetupError {
	let message = err
		.dyn_ref::<js_sys::Error>()
		.map(|err| String::from(err.message()))
		.unwrap_or_else(|| format!("{:?}", err));

	SetupError::Engine(message)
}
