use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::broadcast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

use self::engines::BrowserEngineFactory;
use self::errors::{EventError, EventErrorExt};
use self::events::{EventManager, EventType};
use self::fetch::XhrFetcher;
use self::latency::{LiveEdgeChaser, LiveEdgeSettings};
use self::settings::{PlayerSettings, PlayerSettingsParsed};
use self::spawn::{spawn_status_pump, BrowserRuntime};
use crate::health::{Collaborators, SessionController, SetupReason};
use crate::tracing_wasm;

pub mod engines;
mod errors;
mod events;
mod fetch;
pub mod latency;
mod settings;
mod spawn;
mod util;

#[wasm_bindgen(typescript_custom_section)]
const _: &'static str = r#"
type PlayerEvents = {
	error: (evt: EventError) => void;
	loading: (evt: LoadingEvent) => void;
	playing: () => void;
	offline: (evt: OfflineEvent) => void;
	destroyed: () => void;
};

class Player {
	constructor(el: HTMLVideoElement, settings: PlayerSettings);

	start(): void;
	setup(url: string, reason: string): void;
	switchLine(url: string): void;
	refresh(): void;
	destroy(): void;

	on<K extends keyof PlayerEvents>(event: K, f: PlayerEvents[K]): void;
	off<K extends keyof PlayerEvents>(event: K, f: PlayerEvents[K]): void;
	once<K extends keyof PlayerEvents>(event: K, f: PlayerEvents[K]): void;

	readonly state: "idle" | "fresh" | "recovering" | "investigating" | "offline" | "polling" | "failed";
	readonly recoveryAttempts: number;
	readonly isInvestigating: boolean;
	readonly currentUrl: string | null;
	readonly userSelectedUrl: string | null;
	readonly lines: { name: string; url: string; fallback?: string }[];
}
"#;

#[wasm_bindgen(skip_typescript)]
pub struct Player {
	controller: SessionController,
	events: Rc<RefCell<EventManager>>,
	shutdown_sender: broadcast::Sender<()>,
	_live_edge: Option<LiveEdgeChaser>,
}

#[wasm_bindgen]
impl Player {
	#[wasm_bindgen(constructor)]
	pub fn new(el: HtmlVideoElement, settings: JsValue) -> Result<Player, JsValue> {
		let settings = PlayerSettingsParsed::from(PlayerSettings::parse(settings).map_err(|err| JsValue::from_str(&err))?);

		tracing_wasm::set_max_level(settings.logging_level());

		let events = Rc::new(RefCell::new(EventManager::new()));
		let (shutdown_sender, _) = broadcast::channel(1);

		let collaborators = Collaborators {
			runtime: Rc::new(BrowserRuntime),
			fetcher: Rc::new(XhrFetcher::new(settings.fetch_timeout_ms)),
			engines: Rc::new(BrowserEngineFactory::new(el.clone(), Rc::downgrade(&events))),
		};

		let (controller, status_rx) =
			SessionController::new(settings.health_config(), settings.lines.clone(), collaborators);

		spawn_status_pump(status_rx, shutdown_sender.subscribe(), events.clone());

		let live_edge = settings.live_edge_chase.then(|| {
			LiveEdgeChaser::new(
				el,
				LiveEdgeSettings {
					check_interval_ms: settings.live_edge_check_interval_ms,
					max_lag_s: settings.live_edge_max_lag_s,
					target_lag_s: settings.live_edge_target_lag_s,
				},
			)
		});

		tracing::info!(lines = settings.lines.len(), "player created");

		Ok(Self {
			controller,
			events,
			shutdown_sender,
			_live_edge: live_edge,
		})
	}

	/// Loads the first configured line.
	pub fn start(&self) -> Result<(), JsValue> {
		self.controller.start().map_err(|err| EventError::from(err).into())
	}

	/// Loads `url` for the given reason. A reason ending in `_recovery` leaves the
	/// selected line and the recovery counter alone.
	pub fn setup(&self, url: &str, reason: String) -> Result<(), JsValue> {
		self.controller
			.setup(url, SetupReason::new(reason))
			.map_err(|err| EventError::from(err).into())
	}

	#[wasm_bindgen(js_name = switchLine)]
	pub fn switch_line(&self, url: &str) -> Result<(), JsValue> {
		self.controller.switch_line(url).map_err(|err| EventError::from(err).into())
	}

	pub fn refresh(&self) -> Result<(), JsValue> {
		self.controller.refresh().map_err(|err| EventError::from(err).into())
	}

	pub fn destroy(&self) {
		self.controller.destroy();
	}

	#[wasm_bindgen(js_name = on)]
	pub fn on(&self, event: &str, f: JsValue) -> Result<(), JsValue> {
		let event = parse_event(event)?;
		self.events.borrow_mut().add_event_listener(event, f, false);
		Ok(())
	}

	#[wasm_bindgen(js_name = off)]
	pub fn off(&self, event: &str, f: JsValue) -> Result<(), JsValue> {
		let event = parse_event(event)?;
		self.events.borrow_mut().remove_event_listener(event, f);
		Ok(())
	}

	#[wasm_bindgen(js_name = once)]
	pub fn once(&self, event: &str, f: JsValue) -> Result<(), JsValue> {
		let event = parse_event(event)?;
		self.events.borrow_mut().add_event_listener(event, f, true);
		Ok(())
	}

	#[wasm_bindgen(getter = state)]
	pub fn state(&self) -> String {
		self.controller.phase().as_str().to_string()
	}

	#[wasm_bindgen(getter = recoveryAttempts)]
	pub fn recovery_attempts(&self) -> u32 {
		self.controller.recovery_attempts()
	}

	#[wasm_bindgen(getter = isInvestigating)]
	pub fn is_investigating(&self) -> bool {
		self.controller.is_investigating()
	}

	#[wasm_bindgen(getter = currentUrl)]
	pub fn current_url(&self) -> Option<String> {
		self.controller.current_url()
	}

	#[wasm_bindgen(getter = userSelectedUrl)]
	pub fn user_selected_url(&self) -> Option<String> {
		self.controller.user_selected_url()
	}

	#[wasm_bindgen(getter = lines)]
	pub fn lines(&self) -> Result<JsValue, JsValue> {
		serde_wasm_bindgen::to_value(self.controller.lines())
			.map_err(JsValue::from)
			.other_error("failed to serialize lines", false)
			.map_err(JsValue::from)
	}
}

impl Drop for Player {
	fn drop(&mut self) {
		self.controller.destroy();
		self.shutdown_sender.send(()).ok();
	}
}

fn parse_event(event: &str) -> Result<EventType, JsValue> {
	event
		.parse()
		.map_err(|_| JsValue::from_str(&format!("unknown event: {event}")))
}
