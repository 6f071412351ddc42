use super::controller::{SessionController, StatusEvent};
use super::state::{FailureVerdict, SetupReason};

/// Why the stream was declared offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
	Fatal,
	Stall,
	ImmediateOffline,
	InvestigationFailed,
}

impl FailureReason {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Fatal => "fatal",
			Self::Stall => "stall",
			Self::ImmediateOffline => "immediate_offline",
			Self::InvestigationFailed => "investigation_failed",
		}
	}
}

impl std::fmt::Display for FailureReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl SessionController {
	pub(super) fn on_success(&self) {
		if self.state_mut().on_success() {
			tracing::info!("playback resumed, recovery counter reset");
		}

		self.emit(StatusEvent::Playing);
	}

	/// Counts a failure and either reconnects after a delay or gives up on the stream.
	pub(super) fn on_recoverable_failure(&self, reason: FailureReason) {
		let verdict = self.state_mut().register_failure();

		match verdict {
			FailureVerdict::Retry { attempts } => {
				tracing::warn!(
					attempts,
					max = self.0.config.max_recovery_attempts,
					"recoverable failure ({}), reconnecting",
					reason
				);

				self.with_engine(|engine| engine.stop_load());
				self.schedule_reconnect();
			}
			FailureVerdict::Exhausted { attempts } => self.declare_offline(reason, attempts),
		}
	}

	fn schedule_reconnect(&self) {
		let Some(target) = self.user_selected_url() else {
			return;
		};

		let epoch = self.state().epoch();
		let controller = self.downgrade();
		let mut shutdown = self.subscribe_shutdown();
		let delay = self.0.collaborators.runtime.sleep(self.0.config.reconnect_delay_ms);

		self.spawn(async move {
			tokio::select! {
				biased;
				_ = shutdown.recv() => return,
				_ = delay => {},
			}

			let Some(controller) = controller.upgrade() else {
				return;
			};

			if !controller.is_current(epoch) {
				return;
			}

			controller.setup(&target, SetupReason::RECONNECT).ok();
		});
	}

	/// Stops the decoder session and hands over to the offline poller.
	pub(super) fn declare_offline(&self, reason: FailureReason, attempts: u32) {
		tracing::warn!(attempts, "stream offline ({})", reason);

		self.teardown_session();
		let epoch = self.state_mut().declare_offline();

		self.emit(StatusEvent::Offline { reason, attempts });
		self.start_offline_poller(epoch);
	}
}
