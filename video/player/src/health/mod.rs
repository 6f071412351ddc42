//! Decides whether an interrupted live stream is a hiccup, a frozen broadcast or
//! an offline source, and drives reconnects, investigations and offline polling.
//!
//! Nothing in here touches the browser. Timers, fetches and decoder engines come in
//! through the traits in [`platform`] and [`engine`].

mod classifier;
mod config;
mod controller;
mod engine;
mod error;
mod investigator;
mod platform;
mod poller;
mod recovery;
mod state;

pub use classifier::{classify, Classification, ImmediateOfflinePolicy};
pub use config::HealthConfig;
pub use controller::{SessionController, StatusEvent};
pub use engine::{DecoderEngine, EngineError, EngineEvent, EngineEventSender, EngineFactory, ErrorKind};
pub use error::SetupError;
pub use platform::{
	Collaborators, FetchError, FetchResult, Fetcher, HttpRequest, HttpResponse, LocalBoxFuture, Method, Runtime,
};
pub use poller::probe_revival;
pub use recovery::FailureReason;
pub use state::{FailureVerdict, Phase, SessionState, SetupReason, RECOVERY_MARKER};
