use live_player_types::StreamLines;
use wasm_bindgen::JsValue;

use crate::health::HealthConfig;

#[derive(tsify::Tsify, Debug, Default, serde::Deserialize, serde::Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[tsify(from_wasm_abi, into_wasm_abi)]
pub enum LoggingLevel {
	#[default]
	Info,
	Trace,
	Debug,
	Warn,
	Error,
}

#[derive(tsify::Tsify, Debug, serde::Deserialize)]
/// Settings to configure the player.
#[tsify(from_wasm_abi)]
pub struct PlayerSettings {
	/// The stream lines the viewer can pick from. The first one is loaded by `start()`.
	/// Each line is `{ name?, url, fallback? }`, the fallback is only used when the
	/// browser cannot play the format of `url`.
	#[tsify(type = "{ name?: string; url: string; fallback?: string }[]")]
	pub lines: StreamLines,

	/// Consecutive failures before the stream is declared offline.
	/// Defaults to 3
	#[tsify(optional)]
	#[serde(default)]
	pub max_recovery_attempts: Option<u32>,

	/// The delay before reconnecting after a recoverable failure.
	/// Defaults to 1500ms
	#[tsify(optional)]
	#[serde(default)]
	pub reconnect_delay_ms: Option<u32>,

	/// The number of playlist fetches made to decide whether a stalled hls stream is still advancing.
	/// Defaults to 3
	#[tsify(optional)]
	#[serde(default)]
	pub investigation_checks: Option<u32>,

	/// The delay between two playlist fetches of a stall investigation.
	/// Defaults to 1500ms
	#[tsify(optional)]
	#[serde(default)]
	pub investigation_interval_ms: Option<u32>,

	/// How often an offline source is polled in the background.
	/// Defaults to 5000ms
	#[tsify(optional)]
	#[serde(default)]
	pub offline_poll_interval_ms: Option<u32>,

	/// Http statuses that mean the stream is offline when they come back on the first attempt.
	/// An empty list always goes through the regular recovery instead.
	/// Defaults to [404]
	#[tsify(optional)]
	#[serde(default)]
	pub immediate_offline_status_codes: Option<Vec<u16>>,

	/// The timeout of every playlist and probe request.
	/// Defaults to 8000ms
	#[tsify(optional)]
	#[serde(default)]
	pub fetch_timeout_ms: Option<u32>,

	/// Seek forward when playback drifts too far behind the live edge.
	/// Defaults to true
	#[tsify(optional)]
	#[serde(default)]
	pub live_edge_chase: Option<bool>,

	/// How often the distance to the live edge is checked.
	/// Defaults to 1000ms
	#[tsify(optional)]
	#[serde(default)]
	pub live_edge_check_interval_ms: Option<u32>,

	/// How far behind the buffered end playback may fall before seeking.
	/// Defaults to 3.0 seconds
	#[tsify(optional)]
	#[serde(default)]
	pub live_edge_max_lag_s: Option<f64>,

	/// Where to land behind the buffered end when seeking.
	/// Defaults to 1.0 seconds
	#[tsify(optional)]
	#[serde(default)]
	pub live_edge_target_lag_s: Option<f64>,

	/// The logging level to use for the player.
	/// Defaults to "info"
	#[tsify(optional)]
	#[serde(default)]
	pub logging_level: Option<LoggingLevel>,
}

macro_rules! if_set {
	($value:ident => $target:ident { $($i:ident),* $(,)? }) => {
		{
			$(
				if let Some($i) = $value.$i {
					$target.$i = $i;
				}
			)*
		}
	};
}

impl PlayerSettings {
	/// Reads the settings object, reporting the path of the first field that does not fit.
	pub fn parse(value: JsValue) -> Result<Self, String> {
		let deserializer = serde_wasm_bindgen::Deserializer::from(value);

		serde_path_to_error::deserialize(deserializer)
			.map_err(|err| format!("failed to deserialize settings ({}): {}", err.path(), err.inner()))
	}
}

impl From<PlayerSettings> for PlayerSettingsParsed {
	fn from(value: PlayerSettings) -> Self {
		let mut target = Self::with_lines(value.lines);

		if_set!(value => target {
			max_recovery_attempts,
			reconnect_delay_ms,
			investigation_checks,
			investigation_interval_ms,
			offline_poll_interval_ms,
			immediate_offline_status_codes,
			fetch_timeout_ms,
			live_edge_chase,
			live_edge_check_interval_ms,
			live_edge_max_lag_s,
			live_edge_target_lag_s,
			logging_level,
		});

		target
	}
}

#[derive(Debug)]
pub struct PlayerSettingsParsed {
	pub lines: StreamLines,
	pub max_recovery_attempts: u32,
	pub reconnect_delay_ms: u32,
	pub investigation_checks: u32,
	pub investigation_interval_ms: u32,
	pub offline_poll_interval_ms: u32,
	pub immediate_offline_status_codes: Vec<u16>,
	pub fetch_timeout_ms: u32,
	pub live_edge_chase: bool,
	pub live_edge_check_interval_ms: u32,
	pub live_edge_max_lag_s: f64,
	pub live_edge_target_lag_s: f64,
	pub logging_level: LoggingLevel,
}

impl PlayerSettingsParsed {
	/// Lines are required from the user, everything else has a default.
	pub fn with_lines(lines: StreamLines) -> Self {
		let health = HealthConfig::default();

		Self {
			lines,
			max_recovery_attempts: health.max_recovery_attempts,
			reconnect_delay_ms: health.reconnect_delay_ms,
			investigation_checks: health.investigation_checks,
			investigation_interval_ms: health.investigation_interval_ms,
			offline_poll_interval_ms: health.offline_poll_interval_ms,
			immediate_offline_status_codes: health.immediate_offline_status_codes,
			fetch_timeout_ms: 8000,
			live_edge_chase: true,
			live_edge_check_interval_ms: 1000,
			live_edge_max_lag_s: 3.0,
			live_edge_target_lag_s: 1.0,
			logging_level: LoggingLevel::Info,
		}
	}

	pub fn logging_level(&self) -> tracing::Level {
		match self.logging_level {
			LoggingLevel::Info => tracing::Level::INFO,
			LoggingLevel::Trace => tracing::Level::TRACE,
			LoggingLevel::Debug => tracing::Level::DEBUG,
			LoggingLevel::Warn => tracing::Level::WARN,
			LoggingLevel::Error => tracing::Level::ERROR,
		}
	}

	pub fn health_config(&self) -> HealthConfig {
		HealthConfig {
			max_recovery_attempts: self.max_recovery_attempts,
			reconnect_delay_ms: self.reconnect_delay_ms,
			investigation_checks: self.investigation_checks,
			investigation_interval_ms: self.investigation_interval_ms,
			offline_poll_interval_ms: self.offline_poll_interval_ms,
			immediate_offline_status_codes: self.immediate_offline_status_codes.clone(),
		}
	}
}
