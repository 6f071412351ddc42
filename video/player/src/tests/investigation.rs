use live_player_types::StreamSource;

use super::support::*;
use crate::health::{EngineEvent, ErrorKind, FailureReason, FetchError, HttpResponse, Phase, StatusEvent};

fn frozen() -> String {
	media_playlist(7, &["seg7.ts?token=a", "seg8.ts?token=a", "seg9.ts?token=a"])
}

fn advanced() -> String {
	media_playlist(8, &["seg8.ts?token=a", "seg9.ts?token=a", "seg10.ts?token=a"])
}

async fn stalled_session(h: &Harness) {
	h.controller.start().unwrap();
	settle().await;
	h.engines.emit(stalled());
	settle().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn frozen_playlist_goes_offline_once() {
	run_local(async {
		let mut h = Harness::hls();
		h.fetcher.respond(HLS_URL, 200, frozen());

		stalled_session(&h).await;
		assert!(h.controller.is_investigating());
		assert_eq!(h.fetcher.count(HLS_URL), 1);

		advance(1500).await;
		assert_eq!(h.fetcher.count(HLS_URL), 2);
		assert!(h.controller.is_investigating());

		advance(1500).await;
		assert_eq!(h.fetcher.count(HLS_URL), 3);
		assert!(!h.controller.is_investigating());
		assert_eq!(h.controller.phase(), Phase::Polling);
		assert_eq!(h.controller.last_known_stale_content(), Some(frozen()));
		assert!(h.engines.last().borrow().destroyed);

		let statuses = h.statuses();
		assert_eq!(Harness::offline_count(&statuses), 1);
		assert_eq!(
			statuses.last(),
			Some(&StatusEvent::Offline {
				reason: FailureReason::InvestigationFailed,
				attempts: 3
			})
		);

		// The poller keeps seeing the same playlist, which revives nothing.
		advance(20_000).await;
		assert_eq!(h.engines.count(), 1);
		assert_eq!(Harness::offline_count(&h.statuses()), 0);
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn rotating_query_strings_are_not_progress() {
	run_local(async {
		let mut h = Harness::hls();
		h.fetcher.respond_sequence(
			HLS_URL,
			&[frozen(), frozen().replace("token=a", "token=b"), frozen().replace("token=a", "token=c")],
		);

		stalled_session(&h).await;
		advance(3000).await;

		assert_eq!(h.fetcher.count(HLS_URL), 3);
		assert_eq!(h.controller.phase(), Phase::Polling);
		assert_eq!(Harness::offline_count(&h.statuses()), 1);
		assert_eq!(
			h.controller.last_known_stale_content(),
			Some(frozen().replace("token=a", "token=c"))
		);
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn advancing_playlist_is_healthy() {
	run_local(async {
		let mut h = Harness::hls();
		h.fetcher.respond_sequence(HLS_URL, &[frozen(), advanced()]);

		h.controller.start().unwrap();
		settle().await;

		// Start from a non zero counter.
		h.engines.emit(fatal(ErrorKind::Network));
		settle().await;
		advance(1600).await;
		assert_eq!(h.controller.recovery_attempts(), 1);

		h.engines.emit(stalled());
		settle().await;
		assert_eq!(h.controller.phase(), Phase::Investigating { attempts: 1 });

		advance(1500).await;

		assert_eq!(h.fetcher.count(HLS_URL), 2);
		assert!(!h.controller.is_investigating());
		assert_eq!(h.controller.phase(), Phase::Fresh);
		assert_eq!(h.controller.recovery_attempts(), 0);

		// No third fetch and no verdict later on.
		advance(10_000).await;
		assert_eq!(h.fetcher.count(HLS_URL), 2);
		assert_eq!(Harness::offline_count(&h.statuses()), 0);
		assert_eq!(h.engines.count(), 2);
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failing_fetches_go_offline() {
	run_local(async {
		let mut h = Harness::hls();
		h.fetcher.respond(HLS_URL, 503, "");

		stalled_session(&h).await;
		advance(3000).await;

		assert_eq!(h.fetcher.count(HLS_URL), 3);
		assert_eq!(h.controller.phase(), Phase::Polling);
		assert_eq!(h.controller.last_known_stale_content(), None);
		assert_eq!(Harness::offline_count(&h.statuses()), 1);
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn a_failed_fetch_is_skipped_in_the_comparison() {
	run_local(async {
		let h = Harness::hls();
		h.fetcher.script(
			HLS_URL,
			vec![
				Ok(HttpResponse::new(200, frozen())),
				Err(FetchError::Timeout),
				Ok(HttpResponse::new(200, advanced())),
			],
		);

		stalled_session(&h).await;
		advance(3000).await;

		assert_eq!(h.fetcher.count(HLS_URL), 3);
		assert_eq!(h.controller.phase(), Phase::Fresh);
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn refresh_cancels_the_investigation() {
	run_local(async {
		let mut h = Harness::hls();
		h.fetcher.respond(HLS_URL, 200, frozen());

		stalled_session(&h).await;
		assert_eq!(h.fetcher.count(HLS_URL), 1);

		h.controller.refresh().unwrap();
		assert!(!h.controller.is_investigating());
		assert_eq!(h.controller.phase(), Phase::Fresh);
		assert_eq!(h.controller.recovery_attempts(), 0);

		advance(10_000).await;

		assert_eq!(h.fetcher.count(HLS_URL), 1);
		assert_eq!(h.controller.phase(), Phase::Fresh);
		assert_eq!(Harness::offline_count(&h.statuses()), 0);
		assert_eq!(h.engines.count(), 2);
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn errors_are_ignored_while_investigating() {
	run_local(async {
		let h = Harness::hls();
		h.fetcher.respond_sequence(HLS_URL, &[frozen(), advanced()]);

		stalled_session(&h).await;

		h.engines.emit(fatal(ErrorKind::Network));
		h.engines.emit(not_found());
		h.engines.emit(stalled());
		settle().await;

		assert!(h.controller.is_investigating());
		assert_eq!(h.controller.recovery_attempts(), 0);
		assert_eq!(h.engines.last().borrow().stop_loads, 0);
		assert_eq!(h.fetcher.count(HLS_URL), 1);

		// Playing during an investigation does not release the lock.
		h.engines.emit(EngineEvent::Playing);
		settle().await;
		assert!(h.controller.is_investigating());
	})
	.await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn investigates_the_active_media_playlist() {
	run_local(async {
		const VARIANT: &str = "https://cdn.example.com/live/720p/index.m3u8";

		let h = Harness::new(vec![StreamSource::new("main", HLS_URL)]);
		h.engines.set_media_playlist(Some(VARIANT));
		h.fetcher.respond_sequence(VARIANT, &[frozen(), advanced()]);

		stalled_session(&h).await;
		advance(1500).await;

		assert_eq!(h.fetcher.count(VARIANT), 2);
		assert_eq!(h.fetcher.count(HLS_URL), 0);
		assert_eq!(h.controller.phase(), Phase::Fresh);
	})
	.await;
}
