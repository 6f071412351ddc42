use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

use super::{autoplay, detach_source, js_setup_error, watch_element};
use crate::health::{DecoderEngine, EngineError, EngineEvent, EngineEventSender, ErrorKind, SetupError};
use crate::player::util::Holder;

#[wasm_bindgen]
extern "C" {
	type Hls;

	#[wasm_bindgen(constructor, catch)]
	fn new(config: &JsValue) -> Result<Hls, JsValue>;

	#[wasm_bindgen(static_method_of = Hls, js_name = isSupported, catch)]
	fn is_supported() -> Result<bool, JsValue>;

	#[wasm_bindgen(method, js_name = loadSource)]
	fn load_source(this: &Hls, url: &str);

	#[wasm_bindgen(method, js_name = attachMedia)]
	fn attach_media(this: &Hls, media: &web_sys::HtmlMediaElement);

	#[wasm_bindgen(method, js_name = stopLoad)]
	fn stop_load(this: &Hls);

	#[wasm_bindgen(method)]
	fn destroy(this: &Hls);

	#[wasm_bindgen(method)]
	fn on(this: &Hls, event: &str, listener: &js_sys::Function);

	#[wasm_bindgen(method)]
	fn off(this: &Hls, event: &str, listener: &js_sys::Function);

	#[wasm_bindgen(method, getter)]
	fn levels(this: &Hls) -> JsValue;

	#[wasm_bindgen(method, getter, js_name = currentLevel)]
	fn current_level(this: &Hls) -> i32;
}

const EVENT_ERROR: &str = "hlsError";
const EVENT_MANIFEST_PARSED: &str = "hlsManifestParsed";

/// hls.js is loaded by the page, it may simply not be there.
pub fn is_supported() -> bool {
	let loaded = js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("Hls")).unwrap_or_default();
	loaded && Hls::is_supported().unwrap_or_default()
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct HlsConfig {
	enable_worker: bool,
	live_duration_infinity: bool,
}

/// The part of an `hlsError` payload the adapter reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct HlsErrorData {
	#[serde(rename = "type", default)]
	pub ty: String,
	#[serde(default)]
	pub details: String,
	#[serde(default)]
	pub fatal: bool,
	#[serde(default)]
	pub response: Option<HlsErrorResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct HlsErrorResponse {
	#[serde(default)]
	pub code: Option<u16>,
}

pub fn map_hls_error(data: &HlsErrorData) -> EngineError {
	let kind = match (data.ty.as_str(), data.details.as_str()) {
		(_, "bufferStalledError") => ErrorKind::BufferStalled,
		(_, "manifestLoadError" | "manifestLoadTimeOut" | "levelLoadError") => ErrorKind::ManifestLoad,
		("networkError", _) => ErrorKind::Network,
		("mediaError", _) => ErrorKind::Media,
		_ => ErrorKind::Other,
	};

	// Aborted and cross origin requests report 0, which is no status at all.
	let status = data
		.response
		.as_ref()
		.and_then(|response| response.code)
		.filter(|code| *code != 0);

	EngineError::new(kind, data.fatal)
		.with_status(status)
		.with_detail(format!("{}: {}", data.ty, data.details))
}

pub struct HlsEngine {
	hls: Hls,
	video: HtmlVideoElement,
	on_error: Closure<dyn FnMut(JsValue, JsValue)>,
	on_manifest_parsed: Closure<dyn FnMut(JsValue, JsValue)>,
	_video_events: Holder<HtmlVideoElement>,
	destroyed: bool,
}

impl HlsEngine {
	pub fn new(video: HtmlVideoElement, events: EngineEventSender) -> Result<Self, SetupError> {
		let config = HlsConfig {
			enable_worker: true,
			live_duration_infinity: true,
		};

		let config = serde_wasm_bindgen::to_value(&config).map_err(|err| SetupError::Engine(err.to_string()))?;
		let hls = Hls::new(&config).map_err(js_setup_error)?;

		let on_error = Closure::<dyn FnMut(JsValue, JsValue)>::new({
			let events = events.clone();
			move |_, data: JsValue| {
				let data: HlsErrorData = match serde_wasm_bindgen::from_value(data) {
					Ok(data) => data,
					Err(err) => {
						tracing::warn!("unreadable hls error payload: {}", err);
						return;
					}
				};

				events.send(EngineEvent::Error(map_hls_error(&data))).ok();
			}
		});

		let on_manifest_parsed = Closure::<dyn FnMut(JsValue, JsValue)>::new({
			let events = events.clone();
			move |_, _| {
				events.send(EngineEvent::Connected).ok();
			}
		});

		hls.on(EVENT_ERROR, on_error.as_ref().unchecked_ref());
		hls.on(EVENT_MANIFEST_PARSED, on_manifest_parsed.as_ref().unchecked_ref());

		Ok(Self {
			hls,
			_video_events: watch_element(video.clone(), &events, false),
			video,
			on_error,
			on_manifest_parsed,
			destroyed: false,
		})
	}
}

impl DecoderEngine for HlsEngine {
	fn load(&mut self, url: &str) -> Result<(), SetupError> {
		self.hls.load_source(url);
		self.hls.attach_media(&self.video);
		autoplay(&self.video);
		Ok(())
	}

	fn stop_load(&mut self) {
		self.hls.stop_load();
	}

	fn destroy(&mut self) {
		if std::mem::replace(&mut self.destroyed, true) {
			return;
		}

		self.hls.off(EVENT_ERROR, self.on_error.as_ref().unchecked_ref());
		self.hls.off(EVENT_MANIFEST_PARSED, self.on_manifest_parsed.as_ref().unchecked_ref());
		self.hls.destroy();
		detach_source(&self.video);
	}

	fn active_media_playlist(&self) -> Option<String> {
		let index = u32::try_from(self.hls.current_level()).ok()?;
		let level = js_sys::Reflect::get_u32(&self.hls.levels(), index).ok()?;
		let url = js_sys::Reflect::get(&level, &JsValue::from_str("url")).ok()?;

		// Older releases keep a list of redundant urls per level.
		match url.dyn_ref::<js_sys::Array>() {
			Some(urls) => urls.get(0).as_string(),
			None => url.as_string(),
		}
	}
}

impl Drop for HlsEngine {
	fn drop(&mut self) {
		self.destroy();
	}
}
