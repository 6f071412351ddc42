use crate::health::{classify, Classification, ErrorKind, ImmediateOfflinePolicy};
use crate::player::engines::{map_flv_error, map_hls_error, HlsErrorData};
use crate::player::latency::{live_edge_seek, LiveEdgeSettings};

fn not_found_policy() -> ImmediateOfflinePolicy {
	ImmediateOfflinePolicy::new(vec![404])
}

fn hls_error(payload: serde_json::Value) -> HlsErrorData {
	serde_json::from_value(payload).unwrap()
}

#[test]
fn hls_error_payloads() {
	let data = hls_error(serde_json::json!({
		"type": "networkError",
		"details": "manifestLoadError",
		"fatal": true,
		"response": { "code": 404, "text": "Not Found" },
		"url": "https://cdn.example.com/live/stream.m3u8",
	}));

	let err = map_hls_error(&data);
	assert_eq!(err.kind, ErrorKind::ManifestLoad);
	assert!(err.fatal);
	assert_eq!(err.http_status, Some(404));
	assert_eq!(err.detail, "networkError: manifestLoadError");
	assert_eq!(classify(&err, 0, false, &not_found_policy()), Classification::ImmediateOffline);

	let stalled = map_hls_error(&hls_error(serde_json::json!({
		"type": "mediaError",
		"details": "bufferStalledError",
		"fatal": false,
	})));
	assert_eq!(stalled.kind, ErrorKind::BufferStalled);
	assert!(!stalled.fatal);
	assert_eq!(stalled.http_status, None);
}

#[test]
fn hls_error_kinds() {
	let cases = [
		("networkError", "levelLoadError", ErrorKind::ManifestLoad),
		("networkError", "manifestLoadTimeOut", ErrorKind::ManifestLoad),
		("networkError", "fragLoadError", ErrorKind::Network),
		("mediaError", "bufferAppendError", ErrorKind::Media),
		("muxError", "remuxAllocError", ErrorKind::Other),
		("otherError", "bufferStalledError", ErrorKind::BufferStalled),
	];

	for (ty, details, kind) in cases {
		let data = HlsErrorData {
			ty: ty.into(),
			details: details.into(),
			fatal: true,
			response: None,
		};
		assert_eq!(map_hls_error(&data).kind, kind, "{ty}: {details}");
	}
}

#[test]
fn hls_status_zero_is_no_status() {
	let data = hls_error(serde_json::json!({
		"type": "networkError",
		"details": "fragLoadError",
		"fatal": true,
		"response": { "code": 0 },
	}));
	assert_eq!(map_hls_error(&data).http_status, None);
	assert_eq!(data.response.as_ref().and_then(|response| response.code), Some(0));

	// Missing fields fall back to defaults rather than failing.
	let data = hls_error(serde_json::json!({ "details": "fragLoadError" }));
	let err = map_hls_error(&data);
	assert_eq!(err.kind, ErrorKind::Other);
	assert!(!err.fatal);
}

#[test]
fn flv_errors_are_fatal() {
	let err = map_flv_error("NetworkError", "HttpStatusCodeInvalid", Some(404));
	assert_eq!(err.kind, ErrorKind::Network);
	assert!(err.fatal);
	assert_eq!(err.http_status, Some(404));
	assert_eq!(classify(&err, 0, false, &not_found_policy()), Classification::ImmediateOffline);

	// Only an invalid status code carries a status.
	let err = map_flv_error("NetworkError", "Exception", Some(404));
	assert_eq!(err.http_status, None);
	assert_eq!(classify(&err, 0, false, &not_found_policy()), Classification::FatalRecoverable);

	let err = map_flv_error("MediaError", "MediaMSEError", None);
	assert_eq!(err.kind, ErrorKind::Media);
	assert_eq!(err.detail, "MediaError: MediaMSEError");

	assert_eq!(map_flv_error("OtherError", "UnknownError", None).kind, ErrorKind::Other);
}

#[test]
fn live_edge() {
	let settings = LiveEdgeSettings {
		check_interval_ms: 1000,
		max_lag_s: 3.0,
		target_lag_s: 1.0,
	};

	assert_eq!(live_edge_seek(10.0, 12.0, &settings), None);
	assert_eq!(live_edge_seek(10.0, 13.0, &settings), None);
	assert_eq!(live_edge_seek(10.0, 20.0, &settings), Some(19.0));

	// Never seeks backwards.
	let wide_target = LiveEdgeSettings {
		target_lag_s: 8.0,
		..settings
	};
	assert_eq!(live_edge_seek(10.0, 14.0, &wide_target), Some(10.0));
}
