use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

use super::{autoplay, detach_source, js_setup_error, watch_element};
use crate::health::{DecoderEngine, EngineError, EngineEvent, EngineEventSender, ErrorKind, SetupError};
use crate::player::util::Holder;

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = flvjs, js_name = isSupported, catch)]
	fn flv_is_supported() -> Result<bool, JsValue>;

	#[wasm_bindgen(js_namespace = flvjs, js_name = createPlayer, catch)]
	fn create_player(media_data_source: &JsValue, config: &JsValue) -> Result<FlvPlayer, JsValue>;

	type FlvPlayer;

	#[wasm_bindgen(method, js_name = attachMediaElement)]
	fn attach_media_element(this: &FlvPlayer, media: &web_sys::HtmlMediaElement);

	#[wasm_bindgen(method, js_name = detachMediaElement)]
	fn detach_media_element(this: &FlvPlayer);

	#[wasm_bindgen(method)]
	fn load(this: &FlvPlayer);

	#[wasm_bindgen(method)]
	fn unload(this: &FlvPlayer);

	#[wasm_bindgen(method)]
	fn destroy(this: &FlvPlayer);

	#[wasm_bindgen(method)]
	fn on(this: &FlvPlayer, event: &str, listener: &js_sys::Function);

	#[wasm_bindgen(method)]
	fn off(this: &FlvPlayer, event: &str, listener: &js_sys::Function);
}

const EVENT_ERROR: &str = "error";
const EVENT_MEDIA_INFO: &str = "media_info";

pub fn is_supported() -> bool {
	let loaded = js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("flvjs")).unwrap_or_default();
	loaded && flv_is_supported().unwrap_or_default()
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaDataSource<'a> {
	#[serde(rename = "type")]
	ty: &'static str,
	is_live: bool,
	url: &'a str,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct FlvConfig {
	enable_stash_buffer: bool,
}

/// flv.js has no retries of its own, so every error it reports is final.
pub fn map_flv_error(ty: &str, detail: &str, http_status: Option<u16>) -> EngineError {
	let kind = match ty {
		"NetworkError" => ErrorKind::Network,
		"MediaError" => ErrorKind::Media,
		_ => ErrorKind::Other,
	};

	let status = match detail {
		"HttpStatusCodeInvalid" => http_status,
		_ => None,
	};

	EngineError::new(kind, true)
		.with_status(status)
		.with_detail(format!("{}: {}", ty, detail))
}

struct ActivePlayer {
	player: FlvPlayer,
	on_error: Closure<dyn FnMut(JsValue, JsValue, JsValue)>,
	on_media_info: Closure<dyn FnMut(JsValue)>,
}

impl ActivePlayer {
	fn destroy(self) {
		self.player.off(EVENT_ERROR, self.on_error.as_ref().unchecked_ref());
		self.player.off(EVENT_MEDIA_INFO, self.on_media_info.as_ref().unchecked_ref());
		self.player.unload();
		self.player.detach_media_element();
		self.player.destroy();
	}
}

/// flv.js binds the url at construction, so the player itself is created by `load`.
pub struct FlvEngine {
	video: HtmlVideoElement,
	events: EngineEventSender,
	active: Option<ActivePlayer>,
	_video_events: Holder<HtmlVideoElement>,
}

impl FlvEngine {
	pub fn new(video: HtmlVideoElement, events: EngineEventSender) -> Result<Self, SetupError> {
		if !is_supported() {
			return Err(SetupError::Engine("flv.js is not available".into()));
		}

		Ok(Self {
			_video_events: watch_element(video.clone(), &events, false),
			video,
			events,
			active: None,
		})
	}

	fn create(&self, url: &str) -> Result<ActivePlayer, SetupError> {
		let source = MediaDataSource {
			ty: "flv",
			is_live: true,
			url,
		};
		let config = FlvConfig {
			enable_stash_buffer: false,
		};

		let source = serde_wasm_bindgen::to_value(&source).map_err(|err| SetupError::Engine(err.to_string()))?;
		let config = serde_wasm_bindgen::to_value(&config).map_err(|err| SetupError::Engine(err.to_string()))?;
		let player = create_player(&source, &config).map_err(js_setup_error)?;

		let on_error = Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new({
			let events = self.events.clone();
			move |ty: JsValue, detail: JsValue, info: JsValue| {
				let ty = ty.as_string().unwrap_or_default();
				let detail = detail.as_string().unwrap_or_default();
				let status = js_sys::Reflect::get(&info, &JsValue::from_str("code"))
					.ok()
					.and_then(|code| code.as_f64())
					.and_then(|code| u16::try_from(code as i64).ok());

				events.send(EngineEvent::Error(map_flv_error(&ty, &detail, status))).ok();
			}
		});

		let on_media_info = Closure::<dyn FnMut(JsValue)>::new({
			let events = self.events.clone();
			move |_| {
				events.send(EngineEvent::Connected).ok();
			}
		});

		player.on(EVENT_ERROR, on_error.as_ref().unchecked_ref());
		player.on(EVENT_MEDIA_INFO, on_media_info.as_ref().unchecked_ref());

		Ok(ActivePlayer {
			player,
			on_error,
			on_media_info,
		})
	}
}

impl DecoderEngine for FlvEngine {
	fn load(&mut self, url: &str) -> Result<(), SetupError> {
		if let Some(active) = self.active.take() {
			active.destroy();
		}

		let active = self.create(url)?;
		active.player.attach_media_element(&self.video);
		active.player.load();
		self.active = Some(active);

		autoplay(&self.video);
		Ok(())
	}

	fn stop_load(&mut self) {
		if let Some(active) = &self.active {
			active.player.unload();
		}
	}

	fn destroy(&mut self) {
		if let Some(active) = self.active.take() {
			active.destroy();
			detach_source(&self.video);
		}
	}
}

impl Drop for FlvEngine {
	fn drop(&mut self) {
		self.destroy();
	}
}
