use live_player_types::SourceFormat;

use super::controller::SessionController;
use super::platform::{FetchResult, Fetcher, HttpRequest, HttpResponse};
use super::state::SetupReason;
use crate::hls;

impl SessionController {
	/// Silently watches an offline source until it comes back. The UI keeps showing
	/// the offline status the whole time, ticks are only visible in the logs.
	pub(super) fn start_offline_poller(&self, epoch: u64) {
		let Some(target) = self.user_selected_url() else {
			return;
		};

		if !self.state_mut().start_polling(epoch) {
			return;
		}

		tracing::info!(url = target, "polling offline source");

		let controller = self.downgrade();
		let mut shutdown = self.subscribe_shutdown();
		let runtime = self.0.collaborators.runtime.clone();
		let fetcher = self.0.collaborators.fetcher.clone();
		let interval = self.0.config.offline_poll_interval_ms;

		self.spawn(async move {
			loop {
				tokio::select! {
					biased;
					_ = shutdown.recv() => break,
					_ = runtime.sleep(interval) => {},
				}

				let stale = match controller.upgrade() {
					Some(controller) if controller.is_current(epoch) => controller.last_known_stale_content(),
					_ => break,
				};

				let revived = tokio::select! {
					biased;
					_ = shutdown.recv() => break,
					revived = probe_revival(fetcher.as_ref(), &target, stale.as_deref()) => revived,
				};

				match revived {
					Ok(true) => {}
					Ok(false) => {
						tracing::trace!("source unchanged");
						continue;
					}
					Err(err) => {
						tracing::debug!("offline poll failed: {}", err);
						continue;
					}
				}

				let Some(controller) = controller.upgrade() else {
					break;
				};

				if !controller.is_current(epoch) {
					break;
				}

				tracing::info!(url = target, "source is back");
				controller.state_mut().clear_stale_content();
				controller.setup(&target, SetupReason::REVIVAL).ok();
				break;
			}

			tracing::trace!(epoch, "offline poller stopped");
		});
	}
}

/// One poll of an offline source.
///
/// Anything that is not hls only has to answer. For hls the media playlist has to
/// differ from the one the investigation found frozen, otherwise an origin still
/// serving the last playlist of an ended broadcast would revive it forever.
pub async fn probe_revival(fetcher: &dyn Fetcher, url: &str, stale: Option<&str>) -> FetchResult<bool> {
	if !SourceFormat::from_url(url).is_hls() {
		let response = fetcher.fetch(HttpRequest::head(url)).await?;
		return Ok(response.is_success());
	}

	let master = fetcher.fetch(HttpRequest::get(url)).await?.error_for_status()?;

	let media = if hls::is_media_playlist(&master.body) {
		master.body
	} else {
		let Some(reference) = hls::media_playlist_reference(&master.body) else {
			tracing::debug!("master playlist lists no variants");
			return Ok(false);
		};

		let media_url = hls::resolve_uri(url, reference);
		fetcher
			.fetch(HttpRequest::get(media_url))
			.await
			.and_then(HttpResponse::error_for_status)?
			.body
	};

	let Some(stale) = stale else {
		return Ok(true);
	};

	Ok(hls::normalize(Some(&media)) != hls::normalize(Some(stale)))
}
