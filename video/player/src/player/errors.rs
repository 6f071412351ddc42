use wasm_bindgen::prelude::*;

use crate::health::SetupError;

#[wasm_bindgen(typescript_custom_section)]
const _: &'static str = r#"
interface EventError {
	code: ErrorCode;
	message: string;
	fatal: boolean;
	source?: any;
};

enum ErrorCode {
	Network = "Network",
	Media = "Media",
	Setup = "Setup",
	Other = "Other",
}
"#;

#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
pub struct EventError {
	pub code: ErrorCode,
	#[serde(with = "serde_wasm_bindgen::preserve")]
	pub source: JsValue,
	pub message: String,
	pub fatal: bool,
}

impl EventError {
	pub fn new(code: ErrorCode, message: impl Into<String>, fatal: bool) -> Self {
		Self {
			code,
			source: JsValue::NULL,
			message: message.into(),
			fatal,
		}
	}

	pub fn with_source(mut self, source: JsValue) -> Self {
		self.source = source;
		self
	}
}

impl From<SetupError> for EventError {
	fn from(err: SetupError) -> Self {
		Self::new(ErrorCode::Setup, err.to_string(), true)
	}
}

impl From<EventError> for JsValue {
	fn from(err: EventError) -> Self {
		serde_wasm_bindgen::to_value(&err).unwrap_or_else(|_| JsValue::from_str(&err.message))
	}
}

pub trait EventErrorExt<T>
where
	Self: Sized,
{
	fn other_error(self, message: &'static str, fatal: bool) -> Result<T, EventError> {
		self.convert_error(ErrorCode::Other, message, fatal)
	}

	fn convert_error(self, code: ErrorCode, message: &'static str, fatal: bool) -> Result<T, EventError>;
}

impl<T> EventErrorExt<T> for Result<T, JsValue> {
	fn convert_error(self, code: ErrorCode, message: &'static str, fatal: bool) -> Result<T, EventError> {
		self.map_err(|source| EventError::new(code, message, fatal).with_source(source))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, tsify::Tsify)]
#[tsify(namespace)]
pub enum ErrorCode {
	Network,
	Media,
	Setup,
	Other,
}
