use std::borrow::Cow;

use live_player_types::SourceFormat;

/// Suffix marking a setup as triggered by recovery rather than by the user.
pub const RECOVERY_MARKER: &str = "_recovery";

/// Why a setup happened. A reason ending in [`RECOVERY_MARKER`] never overwrites the
/// url the user picked and never resets the recovery counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetupReason(Cow<'static, str>);

impl SetupReason {
	pub const START: Self = Self(Cow::Borrowed("start"));
	pub const SWITCH_LINE: Self = Self(Cow::Borrowed("switch_line"));
	pub const MANUAL_REFRESH: Self = Self(Cow::Borrowed("manual_refresh"));
	pub const RECONNECT: Self = Self(Cow::Borrowed("reconnect_recovery"));
	pub const REVIVAL: Self = Self(Cow::Borrowed("revival_recovery"));

	pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
		Self(reason.into())
	}

	pub fn recovery(reason: &str) -> Self {
		if reason.ends_with(RECOVERY_MARKER) {
			Self(Cow::Owned(reason.to_string()))
		} else {
			Self(Cow::Owned(format!("{reason}{RECOVERY_MARKER}")))
		}
	}

	pub fn is_recovery(&self) -> bool {
		self.0.ends_with(RECOVERY_MARKER)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for SetupReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
	/// No session, before start or after destroy.
	Idle,
	Fresh,
	Recovering(u32),
	/// A stall investigation holds the lock, engine errors are suppressed.
	Investigating { attempts: u32 },
	Offline,
	/// Offline with the background poller running.
	Polling,
	/// The last setup failed permanently.
	Failed,
}

impl Phase {
	fn with_attempts(attempts: u32) -> Self {
		if attempts == 0 {
			Self::Fresh
		} else {
			Self::Recovering(attempts)
		}
	}

	pub fn recovery_attempts(self) -> u32 {
		match self {
			Self::Recovering(attempts) | Self::Investigating { attempts } => attempts,
			_ => 0,
		}
	}

	pub fn is_investigating(self) -> bool {
		matches!(self, Self::Investigating { .. })
	}

	/// A decoder session is running.
	pub fn is_live(self) -> bool {
		matches!(self, Self::Fresh | Self::Recovering(_) | Self::Investigating { .. })
	}

	pub fn is_offline(self) -> bool {
		matches!(self, Self::Offline | Self::Polling)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Fresh => "fresh",
			Self::Recovering(_) => "recovering",
			Self::Investigating { .. } => "investigating",
			Self::Offline => "offline",
			Self::Polling => "polling",
			Self::Failed => "failed",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
	/// Reconnect and try again.
	Retry { attempts: u32 },
	/// Out of attempts, the stream has to be declared offline.
	Exhausted { attempts: u32 },
}

/// The mutable record of the active session. Every mutation is a transition
/// function on this type, the controller never pokes fields directly.
#[derive(Debug)]
pub struct SessionState {
	phase: Phase,
	current_url: Option<String>,
	current_format: Option<SourceFormat>,
	user_selected_url: Option<String>,
	max_recovery_attempts: u32,
	last_known_stale_content: Option<String>,
	epoch: u64,
}

impl SessionState {
	pub fn new(max_recovery_attempts: u32) -> Self {
		Self {
			phase: Phase::Idle,
			current_url: None,
			current_format: None,
			user_selected_url: None,
			max_recovery_attempts: max_recovery_attempts.max(1),
			last_known_stale_content: None,
			epoch: 0,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	pub fn current_url(&self) -> Option<&str> {
		self.current_url.as_deref()
	}

	pub fn current_format(&self) -> Option<SourceFormat> {
		self.current_format
	}

	pub fn user_selected_url(&self) -> Option<&str> {
		self.user_selected_url.as_deref()
	}

	pub fn recovery_attempts(&self) -> u32 {
		self.phase.recovery_attempts()
	}

	pub fn max_recovery_attempts(&self) -> u32 {
		self.max_recovery_attempts
	}

	pub fn is_investigating(&self) -> bool {
		self.phase.is_investigating()
	}

	pub fn last_known_stale_content(&self) -> Option<&str> {
		self.last_known_stale_content.as_deref()
	}

	/// Starts a new session generation and returns its epoch.
	pub fn begin_setup(&mut self, target: &str, reason: &SetupReason) -> u64 {
		self.epoch += 1;
		self.last_known_stale_content = None;
		self.current_url = None;
		self.current_format = None;

		if reason.is_recovery() {
			// Keeps the counter, drops any investigation or offline state.
			self.phase = Phase::with_attempts(self.phase.recovery_attempts());
		} else {
			self.user_selected_url = Some(target.to_string());
			self.phase = Phase::Fresh;
		}

		self.epoch
	}

	pub fn set_current(&mut self, url: String, format: SourceFormat) {
		self.current_url = Some(url);
		self.current_format = Some(format);
	}

	pub fn fail_setup(&mut self) {
		self.phase = Phase::Failed;
		self.current_url = None;
		self.current_format = None;
	}

	/// Playback resumed. Returns true if the counter was reset.
	pub fn on_success(&mut self) -> bool {
		match self.phase {
			Phase::Recovering(_) => {
				self.phase = Phase::Fresh;
				true
			}
			// The lock stays with the investigation, only the counter resets.
			Phase::Investigating { attempts } if attempts > 0 => {
				self.phase = Phase::Investigating { attempts: 0 };
				true
			}
			_ => false,
		}
	}

	/// A retry bumps the epoch, so the failed engine cannot report again while the
	/// reconnect is pending.
	pub fn register_failure(&mut self) -> FailureVerdict {
		let attempts = (self.phase.recovery_attempts() + 1).min(self.max_recovery_attempts);

		if attempts >= self.max_recovery_attempts {
			FailureVerdict::Exhausted { attempts }
		} else {
			self.epoch += 1;
			self.phase = Phase::Recovering(attempts);
			FailureVerdict::Retry { attempts }
		}
	}

	/// Takes the investigation lock. Only a running session that is not already
	/// being investigated can be investigated.
	pub fn try_begin_investigation(&mut self) -> Option<u64> {
		match self.phase {
			Phase::Fresh | Phase::Recovering(_) => {
				self.phase = Phase::Investigating {
					attempts: self.phase.recovery_attempts(),
				};
				Some(self.epoch)
			}
			_ => None,
		}
	}

	pub fn investigation_held(&self, epoch: u64) -> bool {
		self.epoch == epoch && self.phase.is_investigating()
	}

	/// Releases the lock taken under `epoch`, keeping the counter as it was.
	pub fn end_investigation(&mut self, epoch: u64) -> bool {
		match self.phase {
			Phase::Investigating { attempts } if self.epoch == epoch => {
				self.phase = Phase::with_attempts(attempts);
				true
			}
			_ => false,
		}
	}

	/// The stream was confirmed to be advancing.
	pub fn mark_healthy(&mut self, epoch: u64) -> bool {
		if self.epoch == epoch && self.phase.is_live() {
			self.phase = Phase::Fresh;
			true
		} else {
			false
		}
	}

	/// Releases any investigation lock and pins the counter to the threshold,
	/// so the next failure goes straight to offline.
	pub fn force_exhausted(&mut self) {
		self.phase = Phase::Recovering(self.max_recovery_attempts);
	}

	pub fn cache_stale_content(&mut self, content: Option<String>) {
		self.last_known_stale_content = content;
	}

	pub fn clear_stale_content(&mut self) {
		self.last_known_stale_content = None;
	}

	/// Ends the decoder session. The counter resets so a later manual action starts clean.
	pub fn declare_offline(&mut self) -> u64 {
		self.epoch += 1;
		self.phase = Phase::Offline;
		self.current_url = None;
		self.current_format = None;
		self.epoch
	}

	pub fn start_polling(&mut self, epoch: u64) -> bool {
		if self.epoch == epoch && self.phase == Phase::Offline {
			self.phase = Phase::Polling;
			true
		} else {
			false
		}
	}

	pub fn reset(&mut self) {
		self.epoch += 1;
		self.phase = Phase::Idle;
		self.current_url = None;
		self.current_format = None;
		self.user_selected_url = None;
		self.last_known_stale_content = None;
	}
}
