use gloo_timers::callback::Interval;
use web_sys::HtmlVideoElement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveEdgeSettings {
	pub check_interval_ms: u32,
	pub max_lag_s: f64,
	pub target_lag_s: f64,
}

/// Where to seek so playback lands `target_lag_s` behind the buffered end, if it
/// drifted more than `max_lag_s` behind it.
pub fn live_edge_seek(current_time: f64, buffered_end: f64, settings: &LiveEdgeSettings) -> Option<f64> {
	if buffered_end - current_time <= settings.max_lag_s {
		return None;
	}

	Some((buffered_end - settings.target_lag_s).max(current_time))
}

/// Keeps a live stream close to its edge. Stops when dropped.
pub struct LiveEdgeChaser {
	_interval: Interval,
}

impl LiveEdgeChaser {
	pub fn new(video: HtmlVideoElement, settings: LiveEdgeSettings) -> Self {
		let interval = Interval::new(settings.check_interval_ms, move || {
			if video.paused() || video.seeking() {
				return;
			}

			let buffered = video.buffered();
			let length = buffered.length();
			if length == 0 {
				return;
			}

			let Ok(end) = buffered.end(length - 1) else {
				return;
			};

			let current_time = video.current_time();
			if let Some(target) = live_edge_seek(current_time, end, &settings) {
				tracing::debug!(lag = end - current_time, "behind live edge, seeking to {:.2}", target);
				video.set_current_time(target);
			}
		});

		Self { _interval: interval }
	}
}
