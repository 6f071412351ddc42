use super::engine::{EngineError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
	/// Not found on first contact, the broadcast most likely never started.
	ImmediateOffline,
	/// The engine gave up on its own retries.
	FatalRecoverable,
	/// Stalled without a fatal flag. Could be a hiccup, could be a frozen broadcast.
	NeedsInvestigation,
	/// The engine handles it, or an investigation is already running.
	Ignorable,
}

/// When a first attempt failure is trusted to mean "offline".
///
/// Whether a 404 on first contact means the broadcast never started depends on
/// how the origin answers for unknown streams, so the statuses are configurable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImmediateOfflinePolicy {
	status_codes: Vec<u16>,
}

impl ImmediateOfflinePolicy {
	pub fn new(status_codes: Vec<u16>) -> Self {
		Self { status_codes }
	}

	pub fn disabled() -> Self {
		Self::default()
	}

	/// Only a fatal error counts. A non fatal 404 is a single missing segment the
	/// engine retries on its own.
	pub fn applies(&self, error: &EngineError, recovery_attempts: u32) -> bool {
		error.fatal
			&& recovery_attempts == 0
			&& error.http_status.is_some_and(|status| self.status_codes.contains(&status))
	}
}

/// Labels an engine error for the recovery logic.
///
/// While an investigation holds the lock every signal is ignorable, so overlapping
/// stalls cannot start a second recovery path.
pub fn classify(
	error: &EngineError,
	recovery_attempts: u32,
	investigating: bool,
	policy: &ImmediateOfflinePolicy,
) -> Classification {
	if investigating {
		return Classification::Ignorable;
	}

	if error.fatal {
		if policy.applies(error, recovery_attempts) {
			return Classification::ImmediateOffline;
		}

		return Classification::FatalRecoverable;
	}

	match error.kind {
		ErrorKind::BufferStalled => Classification::NeedsInvestigation,
		_ => Classification::Ignorable,
	}
}
