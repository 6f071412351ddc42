/// Construction time constants of the health engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
	/// Consecutive recoverable failures before the stream is declared offline.
	pub max_recovery_attempts: u32,
	pub reconnect_delay_ms: u32,
	/// Playlist fetches made while investigating a stall.
	pub investigation_checks: u32,
	pub investigation_interval_ms: u32,
	pub offline_poll_interval_ms: u32,
	/// Http statuses that mean "offline" when seen on the first attempt of a session.
	/// Empty disables the fast path.
	pub immediate_offline_status_codes: Vec<u16>,
}

impl Default for HealthConfig {
	fn default() -> Self {
		Self {
			max_recovery_attempts: 3,
			reconnect_delay_ms: 1500,
			investigation_checks: 3,
			investigation_interval_ms: 1500,
			offline_poll_interval_ms: 5000,
			immediate_offline_status_codes: vec![404],
		}
	}
}
