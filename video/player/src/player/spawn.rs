use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use tokio::sync::{broadcast, mpsc};

use super::events::{dispatch, EventManager, UserEvent};
use crate::health::{LocalBoxFuture, Runtime, StatusEvent};

/// Runs the health engine on the page's event loop.
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
	fn spawn(&self, fut: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(fut);
	}

	fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
		Box::pin(TimeoutFuture::new(ms))
	}
}

/// Turns status updates from the controller into page events until the player shuts down.
pub fn spawn_status_pump(
	mut status_rx: mpsc::UnboundedReceiver<StatusEvent>,
	mut shutdown: broadcast::Receiver<()>,
	events: Rc<RefCell<EventManager>>,
) {
	wasm_bindgen_futures::spawn_local(async move {
		loop {
			let status = tokio::select! {
				biased;
				_ = shutdown.recv() => break,
				status = status_rx.recv() => match status {
					Some(status) => status,
					None => break,
				},
			};

			tracing::debug!(?status, "status changed");
			dispatch!(events.borrow_mut().emit(UserEvent::from(status)));
		}

		// The final status is delivered even when the shutdown wins the race.
		while let Ok(status) = status_rx.try_recv() {
			dispatch!(events.borrow_mut().emit(UserEvent::from(status)));
		}
	});
}
