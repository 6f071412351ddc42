use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use super::errors::EventError;
use crate::health::StatusEvent;

pub enum UserEvent {
	Error(EventError),
	Loading(LoadingEvent),
	Playing,
	Offline(OfflineEvent),
	Destroyed,
}

#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
/// The event emitted when a source starts loading.
pub struct LoadingEvent {
	/// The url handed to the decoder, which is the fallback when the primary format is unsupported.
	pub url: String,
}

#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
/// The event emitted when the stream is declared offline.
/// The player keeps polling the source in the background and emits `loading` once it is back.
pub struct OfflineEvent {
	pub reason: String,
	/// Consecutive failures counted when the stream was declared offline.
	pub attempts: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
	Error,
	Loading,
	Playing,
	Offline,
	Destroyed,
}

impl std::str::FromStr for EventType {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"error" => Ok(Self::Error),
			"loading" => Ok(Self::Loading),
			"playing" => Ok(Self::Playing),
			"offline" => Ok(Self::Offline),
			"destroyed" => Ok(Self::Destroyed),
			_ => Err(()),
		}
	}
}

impl UserEvent {
	const fn ty(&self) -> EventType {
		match self {
			Self::Error(_) => EventType::Error,
			Self::Loading(_) => EventType::Loading,
			Self::Playing => EventType::Playing,
			Self::Offline(_) => EventType::Offline,
			Self::Destroyed => EventType::Destroyed,
		}
	}

	fn value(&self) -> Option<JsValue> {
		let value = match self {
			Self::Error(error) => serde_wasm_bindgen::to_value(error),
			Self::Loading(loading) => serde_wasm_bindgen::to_value(loading),
			Self::Offline(offline) => serde_wasm_bindgen::to_value(offline),
			Self::Playing | Self::Destroyed => return None,
		};

		value
			.map_err(|err| tracing::error!("failed to serialize event: {}", err))
			.ok()
	}
}

impl From<EventError> for UserEvent {
	fn from(error: EventError) -> Self {
		Self::Error(error)
	}
}

impl From<StatusEvent> for UserEvent {
	fn from(status: StatusEvent) -> Self {
		match status {
			StatusEvent::Loading { url } => Self::Loading(LoadingEvent { url }),
			StatusEvent::Playing => Self::Playing,
			StatusEvent::Offline { reason, attempts } => Self::Offline(OfflineEvent {
				reason: reason.to_string(),
				attempts,
			}),
			StatusEvent::Error { message } => Self::Error(EventError::new(super::errors::ErrorCode::Setup, message, true)),
			StatusEvent::Destroyed => Self::Destroyed,
		}
	}
}

#[derive(Clone)]
struct EventListener {
	f: js_sys::Function,
	used: Option<Rc<Cell<bool>>>,
}

#[derive(Default)]
pub struct EventManager {
	listeners: HashMap<EventType, Vec<EventListener>>,
	dirty: Rc<Cell<bool>>,
}

impl EventManager {
	pub fn new() -> Self {
		Self::default()
	}

	fn clean(&mut self) {
		if self.dirty.replace(false) {
			for listeners in self.listeners.values_mut() {
				listeners.retain(|x| !x.used.as_ref().is_some_and(|used| used.get()));
			}
		}
	}

	pub fn add_event_listener(&mut self, event: EventType, f: JsValue, once: bool) {
		self.clean();

		self.listeners.entry(event).or_default().push(EventListener {
			f: f.unchecked_into(),
			used: once.then(|| Rc::new(Cell::new(false))),
		});
	}

	pub fn remove_event_listener(&mut self, event: EventType, f: JsValue) {
		self.clean();

		if let Some(listeners) = self.listeners.get_mut(&event) {
			listeners.retain(|x| !JsValue::eq(&x.f, &f));
		}
	}

	/// Listeners run after the manager is released, so they may call back into the player.
	#[must_use = "must be called to process events use dispatch! macro"]
	pub fn emit(&mut self, event: impl Into<UserEvent>) -> impl FnOnce() + 'static {
		self.clean();

		let event = event.into();
		let dirty = self.dirty.clone();
		let listeners = self.listeners.get(&event.ty()).cloned().unwrap_or_default();

		move || {
			if listeners.is_empty() {
				return;
			}

			let value = event.value();
			for listener in listeners {
				if let Some(used) = listener.used.as_ref() {
					if used.replace(true) {
						continue;
					}
					dirty.set(true);
				}

				let result = match &value {
					Some(evt) => listener.f.call1(&JsValue::undefined(), evt),
					None => listener.f.call0(&JsValue::undefined()),
				};

				if let Err(err) = result {
					tracing::error!("event target raised exception: {:?}", err);
				}
			}
		}
	}
}

macro_rules! dispatch {
	($x:expr) => {{
		let f = { $x };
		f()
	}};
}

pub(crate) use dispatch;
