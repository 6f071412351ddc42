use tokio::sync::mpsc;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{XmlHttpRequest, XmlHttpRequestResponseType};

use super::util::{register_events, Holder};
use crate::health::{FetchError, FetchResult, Fetcher, HttpRequest, HttpResponse, LocalBoxFuture, Method};

/// Query parameter appended to every request so no cache can answer it.
const CACHE_BUST_PARAM: &str = "_lp";

enum RequestOutcome {
	Loaded,
	Failed,
	TimedOut,
	Aborted,
}

pub struct FetchRequest {
	method: Method,
	url: String,
	timeout: Option<u32>,
}

pub struct InflightRequest {
	xhr: Holder<XmlHttpRequest>,
	rx: mpsc::Receiver<RequestOutcome>,
}

impl FetchRequest {
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			timeout: None,
		}
	}

	pub fn set_timeout(mut self, timeout: u32) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Sends no custom headers. A cross origin request with any of them needs a
	/// preflight, which most stream origins do not answer.
	pub fn start(&self) -> Result<InflightRequest, JsValue> {
		let req = XmlHttpRequest::new()?;

		req.open(self.method.as_str(), &cache_busted(&self.url))?;
		req.set_response_type(XmlHttpRequestResponseType::Text);

		if let Some(timeout) = self.timeout {
			req.set_timeout(timeout);
		}

		// One outcome per request, the extra slot covers an abort racing a late event.
		let (tx, rx) = mpsc::channel(2);

		let cleanup = register_events!(req, {
			"load" => {
				let tx = tx.clone();
				move |_| {
					tx.try_send(RequestOutcome::Loaded).ok();
				}
			},
			"error" => {
				let tx = tx.clone();
				move |_| {
					tx.try_send(RequestOutcome::Failed).ok();
				}
			},
			"timeout" => {
				let tx = tx.clone();
				move |_| {
					tx.try_send(RequestOutcome::TimedOut).ok();
				}
			},
			"abort" => {
				move |_| {
					tx.try_send(RequestOutcome::Aborted).ok();
				}
			},
		});

		let xhr = Holder::new(req, cleanup);
		xhr.send()?;

		Ok(InflightRequest { xhr, rx })
	}
}

impl InflightRequest {
	pub async fn wait_result(mut self) -> FetchResult<HttpResponse> {
		match self.rx.recv().await {
			Some(RequestOutcome::Loaded) => {}
			Some(RequestOutcome::Failed) => return Err(FetchError::Network("request failed".into())),
			Some(RequestOutcome::TimedOut) => return Err(FetchError::Timeout),
			Some(RequestOutcome::Aborted) | None => return Err(FetchError::Aborted),
		}

		let status = self.xhr.status().map_err(js_error)?;
		let body = self.xhr.response_text().map_err(js_error)?;

		match body {
			Some(body) => Ok(HttpResponse::new(status, body)),
			// HEAD responses carry no text.
			None if self.xhr.ready_state() == XmlHttpRequest::DONE => Ok(HttpResponse::new(status, String::new())),
			None => Err(FetchError::InvalidResponse),
		}
	}
}

impl Drop for InflightRequest {
	fn drop(&mut self) {
		if self.xhr.ready_state() != XmlHttpRequest::DONE {
			self.xhr.abort().ok();
		}
	}
}

fn js_error(err: JsValue) -> FetchError {
	FetchError::Network(format!("{:?}", err))
}

fn cache_busted(url: &str) -> String {
	let stamp = (js_sys::Date::now() as u64).to_string();

	match Url::parse(url) {
		Ok(mut url) => {
			url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &stamp);
			url.to_string()
		}
		// Page relative urls are left for the browser to resolve.
		Err(_) => {
			let (path, fragment) = url.split_once('#').map_or((url, None), |(path, frag)| (path, Some(frag)));
			let separator = if path.contains('?') { '&' } else { '?' };
			let mut busted = format!("{path}{separator}{CACHE_BUST_PARAM}={stamp}");
			if let Some(fragment) = fragment {
				busted.push('#');
				busted.push_str(fragment);
			}
			busted
		}
	}
}

/// The browser's [`Fetcher`], plain XHR with a cache busting query parameter.
pub struct XhrFetcher {
	timeout_ms: u32,
}

impl XhrFetcher {
	pub fn new(timeout_ms: u32) -> Self {
		Self { timeout_ms }
	}
}

impl Fetcher for XhrFetcher {
	fn fetch(&self, request: HttpRequest) -> LocalBoxFuture<'static, FetchResult<HttpResponse>> {
		tracing::trace!(method = request.method.as_str(), url = request.url, "fetching");

		let inflight = FetchRequest::new(request.method, request.url)
			.set_timeout(self.timeout_ms)
			.start();

		Box::pin(async move {
			match inflight {
				Ok(inflight) => inflight.wait_result().await,
				Err(err) => Err(js_error(err)),
			}
		})
	}
}
