use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use live_player_types::{SourceFormat, StreamLines};
use tokio::sync::{broadcast, mpsc};

use super::classifier::{classify, Classification, ImmediateOfflinePolicy};
use super::config::HealthConfig;
use super::engine::{DecoderEngine, EngineError, EngineEvent};
use super::error::SetupError;
use super::platform::{Collaborators, LocalBoxFuture};
use super::recovery::FailureReason;
use super::state::{Phase, SessionState, SetupReason};

/// What the UI renders. Everything else the engine does is invisible to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
	Loading { url: String },
	Playing,
	Offline { reason: FailureReason, attempts: u32 },
	Error { message: String },
	Destroyed,
}

/// Background work of the current session. Every task selects on a receiver from
/// here, cancelling drops the sender after telling all of them to stop.
pub(super) struct Tasks {
	shutdown: broadcast::Sender<()>,
}

impl Tasks {
	fn new() -> Self {
		let (shutdown, _) = broadcast::channel(1);
		Self { shutdown }
	}

	pub(super) fn subscribe(&self) -> broadcast::Receiver<()> {
		self.shutdown.subscribe()
	}

	fn cancel_all(&mut self) {
		self.shutdown.send(()).ok();
		*self = Self::new();
	}
}

pub(super) struct ControllerInner {
	pub(super) config: HealthConfig,
	pub(super) policy: ImmediateOfflinePolicy,
	pub(super) lines: StreamLines,
	pub(super) collaborators: Collaborators,
	pub(super) state: RefCell<SessionState>,
	engine: RefCell<Option<Box<dyn DecoderEngine>>>,
	tasks: RefCell<Tasks>,
	status: mpsc::UnboundedSender<StatusEvent>,
}

/// Owns the session state and wires decoder engines into the recovery logic.
///
/// Cheap to clone, all clones drive the same session. Background tasks only hold
/// a [`WeakSessionController`] so dropping every handle stops them.
#[derive(Clone)]
pub struct SessionController(pub(super) Rc<ControllerInner>);

#[derive(Clone)]
pub(super) struct WeakSessionController(Weak<ControllerInner>);

impl WeakSessionController {
	pub(super) fn upgrade(&self) -> Option<SessionController> {
		self.0.upgrade().map(SessionController)
	}
}

impl SessionController {
	pub fn new(
		config: HealthConfig,
		lines: StreamLines,
		collaborators: Collaborators,
	) -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
		let (status, status_rx) = mpsc::unbounded_channel();

		let inner = ControllerInner {
			policy: ImmediateOfflinePolicy::new(config.immediate_offline_status_codes.clone()),
			state: RefCell::new(SessionState::new(config.max_recovery_attempts)),
			engine: RefCell::new(None),
			tasks: RefCell::new(Tasks::new()),
			config,
			lines,
			collaborators,
			status,
		};

		(Self(Rc::new(inner)), status_rx)
	}

	pub fn lines(&self) -> &StreamLines {
		&self.0.lines
	}

	pub fn phase(&self) -> Phase {
		self.state().phase()
	}

	pub fn recovery_attempts(&self) -> u32 {
		self.state().recovery_attempts()
	}

	pub fn is_investigating(&self) -> bool {
		self.state().is_investigating()
	}

	pub fn current_url(&self) -> Option<String> {
		self.state().current_url().map(str::to_string)
	}

	pub fn user_selected_url(&self) -> Option<String> {
		self.state().user_selected_url().map(str::to_string)
	}

	pub fn last_known_stale_content(&self) -> Option<String> {
		self.state().last_known_stale_content().map(str::to_string)
	}

	/// Initial load of the first configured line.
	pub fn start(&self) -> Result<(), SetupError> {
		let url = self.0.lines.first().ok_or(SetupError::NoLines)?.url.clone();
		self.setup(&url, SetupReason::START)
	}

	pub fn switch_line(&self, url: &str) -> Result<(), SetupError> {
		self.setup(url, SetupReason::SWITCH_LINE)
	}

	/// Reloads what the user picked last, starting the recovery counter from zero.
	pub fn refresh(&self) -> Result<(), SetupError> {
		let url = self.user_selected_url().ok_or(SetupError::NoSelection)?;
		self.setup(&url, SetupReason::MANUAL_REFRESH)
	}

	pub fn setup(&self, target: &str, reason: SetupReason) -> Result<(), SetupError> {
		tracing::info!(url = target, reason = %reason, "setting up stream");

		self.teardown_session();
		let epoch = self.state_mut().begin_setup(target, &reason);

		match self.attach_engine(target, epoch) {
			Ok(url) => {
				self.emit(StatusEvent::Loading { url });
				Ok(())
			}
			Err(err) => {
				tracing::error!("setup failed: {}", err);
				self.teardown_session();
				self.state_mut().fail_setup();
				self.emit(StatusEvent::Error { message: err.to_string() });
				Err(err)
			}
		}
	}

	pub fn destroy(&self) {
		tracing::info!("destroying session");

		self.teardown_session();
		self.state_mut().reset();
		self.emit(StatusEvent::Destroyed);
	}

	pub(super) fn downgrade(&self) -> WeakSessionController {
		WeakSessionController(Rc::downgrade(&self.0))
	}

	pub(super) fn state(&self) -> Ref<'_, SessionState> {
		self.0.state.borrow()
	}

	pub(super) fn state_mut(&self) -> RefMut<'_, SessionState> {
		self.0.state.borrow_mut()
	}

	pub(super) fn is_current(&self, epoch: u64) -> bool {
		self.state().epoch() == epoch
	}

	pub(super) fn emit(&self, event: StatusEvent) {
		if self.0.status.send(event).is_err() {
			tracing::trace!("status receiver dropped");
		}
	}

	pub(super) fn spawn(&self, fut: impl std::future::Future<Output = ()> + 'static) {
		let fut: LocalBoxFuture<'static, ()> = Box::pin(fut);
		self.0.collaborators.runtime.spawn(fut);
	}

	pub(super) fn subscribe_shutdown(&self) -> tokio::sync::broadcast::Receiver<()> {
		self.0.tasks.borrow().subscribe()
	}

	pub(super) fn with_engine<R>(&self, f: impl FnOnce(&mut (dyn DecoderEngine + 'static)) -> R) -> Option<R> {
		let mut engine = self.0.engine.borrow_mut();
		engine.as_deref_mut().map(f)
	}

	/// Cancels every pending timer, fetch loop and event pump and destroys the
	/// engine. Nothing of the previous session survives this.
	pub(super) fn teardown_session(&self) {
		self.0.tasks.borrow_mut().cancel_all();

		let engine = self.0.engine.borrow_mut().take();
		if let Some(mut engine) = engine {
			engine.destroy();
		}
	}

	/// Picks the source the browser can actually play, substituting the fallback when needed.
	fn resolve_source(&self, target: &str) -> Result<(String, SourceFormat), SetupError> {
		let engines = &self.0.collaborators.engines;

		let format = SourceFormat::from_url(target);
		if engines.supports(format) {
			return Ok((target.to_string(), format));
		}

		let fallback = self.0.lines.find(target).and_then(|line| line.fallback.as_deref());
		if let Some(fallback) = fallback.filter(|fallback| *fallback != target) {
			let fallback_format = SourceFormat::from_url(fallback);
			if engines.supports(fallback_format) {
				tracing::info!(url = fallback, "{} is not supported, using fallback", format);
				return Ok((fallback.to_string(), fallback_format));
			}
		}

		Err(SetupError::UnsupportedFormat {
			url: target.to_string(),
			format,
		})
	}

	fn attach_engine(&self, target: &str, epoch: u64) -> Result<String, SetupError> {
		let (url, format) = self.resolve_source(target)?;

		let (tx, rx) = mpsc::unbounded_channel();
		let mut engine = self.0.collaborators.engines.create(format, tx)?;
		engine.load(&url)?;

		self.state_mut().set_current(url.clone(), format);
		*self.0.engine.borrow_mut() = Some(engine);

		self.spawn_event_pump(epoch, rx);

		Ok(url)
	}

	fn spawn_event_pump(&self, epoch: u64, mut events: mpsc::UnboundedReceiver<EngineEvent>) {
		let controller = self.downgrade();
		let mut shutdown = self.subscribe_shutdown();

		self.spawn(async move {
			loop {
				let event = tokio::select! {
					biased;
					_ = shutdown.recv() => break,
					event = events.recv() => match event {
						Some(event) => event,
						None => break,
					},
				};

				let Some(controller) = controller.upgrade() else {
					break;
				};

				controller.handle_engine_event(epoch, event);
			}

			tracing::trace!(epoch, "engine event pump stopped");
		});
	}

	pub(super) fn handle_engine_event(&self, epoch: u64, event: EngineEvent) {
		if !self.is_current(epoch) {
			tracing::trace!(epoch, "dropping event from a previous session");
			return;
		}

		match event {
			EngineEvent::Playing => self.on_success(),
			EngineEvent::Connected => tracing::debug!("engine connected"),
			EngineEvent::Error(error) => self.handle_engine_error(error),
		}
	}

	fn handle_engine_error(&self, error: EngineError) {
		let (classification, format) = {
			let state = self.state();
			if !state.phase().is_live() {
				return;
			}

			(
				classify(&error, state.recovery_attempts(), state.is_investigating(), &self.0.policy),
				state.current_format(),
			)
		};

		tracing::debug!(?error, ?classification, "engine error");

		match classification {
			Classification::Ignorable => {}
			Classification::ImmediateOffline => {
				tracing::warn!(status = ?error.http_status, "source not found on first contact");
				self.declare_offline(FailureReason::ImmediateOffline, self.recovery_attempts());
			}
			Classification::FatalRecoverable => self.on_recoverable_failure(FailureReason::Fatal),
			Classification::NeedsInvestigation if format.is_some_and(SourceFormat::is_hls) => self.investigate(),
			// Without a playlist there is nothing to investigate.
			Classification::NeedsInvestigation => self.on_recoverable_failure(FailureReason::Stall),
		}
	}
}
