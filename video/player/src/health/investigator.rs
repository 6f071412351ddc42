use super::controller::{SessionController, WeakSessionController};
use super::platform::{HttpRequest, HttpResponse};
use super::recovery::FailureReason;
use crate::hls::normalize;

/// Releases the investigation lock however the investigation task ends.
struct InvestigationGuard {
	controller: WeakSessionController,
	epoch: u64,
}

impl Drop for InvestigationGuard {
	fn drop(&mut self) {
		let Some(controller) = self.controller.upgrade() else {
			return;
		};

		let Ok(mut state) = controller.0.state.try_borrow_mut() else {
			tracing::warn!("session state busy, investigation lock not released");
			return;
		};

		if state.end_investigation(self.epoch) {
			tracing::debug!("investigation lock released");
		}
	}
}

enum Verdict {
	Advancing,
	/// Carries the raw text of the last successful fetch, if any succeeded.
	Stale(Option<String>),
}

impl SessionController {
	/// Fetches the live media playlist a few times to find out whether a stalled
	/// stream is still advancing. Does nothing if an investigation is already running.
	pub(super) fn investigate(&self) {
		let Some(epoch) = self.state_mut().try_begin_investigation() else {
			return;
		};

		let url = self
			.with_engine(|engine| engine.active_media_playlist())
			.flatten()
			.or_else(|| self.current_url());

		let Some(url) = url else {
			self.state_mut().end_investigation(epoch);
			return;
		};

		tracing::info!(url, "buffer stalled, investigating playlist");

		let guard = InvestigationGuard {
			controller: self.downgrade(),
			epoch,
		};
		let controller = self.downgrade();
		let mut shutdown = self.subscribe_shutdown();

		self.spawn(async move {
			let _guard = guard;

			let verdict = tokio::select! {
				biased;
				_ = shutdown.recv() => None,
				verdict = run_checks(&controller, epoch, &url) => verdict,
			};

			let (Some(verdict), Some(controller)) = (verdict, controller.upgrade()) else {
				return;
			};

			match verdict {
				Verdict::Advancing => {
					if controller.state_mut().mark_healthy(epoch) {
						tracing::info!("playlist is advancing, stall was transient");
					}
				}
				Verdict::Stale(content) => {
					if !controller.state().investigation_held(epoch) {
						return;
					}

					tracing::warn!("playlist stopped advancing");

					{
						let mut state = controller.state_mut();
						state.cache_stale_content(content);
						state.force_exhausted();
					}

					controller.on_recoverable_failure(FailureReason::InvestigationFailed);
				}
			}
		});
	}
}

/// Returns `None` when the investigation was abandoned without a verdict.
async fn run_checks(controller: &WeakSessionController, epoch: u64, url: &str) -> Option<Verdict> {
	let (fetcher, runtime, checks, interval) = {
		let controller = controller.upgrade()?;
		let collaborators = &controller.0.collaborators;
		(
			collaborators.fetcher.clone(),
			collaborators.runtime.clone(),
			controller.0.config.investigation_checks,
			controller.0.config.investigation_interval_ms,
		)
	};

	let mut previous: Option<String> = None;
	let mut last_content: Option<String> = None;

	for check in 0..checks {
		if check > 0 {
			runtime.sleep(interval).await;
		}

		if !controller.upgrade()?.state().investigation_held(epoch) {
			tracing::debug!("investigation superseded");
			return None;
		}

		let response = fetcher
			.fetch(HttpRequest::get(url))
			.await
			.and_then(HttpResponse::error_for_status);

		let body = match response {
			Ok(response) => response.body,
			Err(err) => {
				tracing::debug!(check, "playlist fetch failed: {}", err);
				continue;
			}
		};

		let normalized = normalize(Some(&body));
		tracing::trace!(check, "fetched playlist");

		if previous.is_some() && previous != normalized {
			return Some(Verdict::Advancing);
		}

		previous = normalized;
		last_content = Some(body);
	}

	Some(Verdict::Stale(last_content))
}
