use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The single threaded executor the engine schedules its timers and tasks on.
pub trait Runtime {
	fn spawn(&self, fut: LocalBoxFuture<'static, ()>);

	fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Head,
}

impl Method {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Head => "HEAD",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
}

impl HttpRequest {
	pub fn get(url: impl Into<String>) -> Self {
		Self {
			method: Method::Get,
			url: url.into(),
		}
	}

	pub fn head(url: impl Into<String>) -> Self {
		Self {
			method: Method::Head,
			url: url.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: String,
}

impl HttpResponse {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			body: body.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub fn error_for_status(self) -> FetchResult<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(FetchError::Status(self.status))
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
	#[error("server returned status code {0}")]
	Status(u16),
	#[error("network error: {0}")]
	Network(String),
	#[error("request was aborted")]
	Aborted,
	#[error("request timed out")]
	Timeout,
	#[error("response was invalid")]
	InvalidResponse,
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Fetches bypassing every cache between us and the origin.
/// Any http status is a successful fetch, callers decide what a status means.
pub trait Fetcher {
	fn fetch(&self, request: HttpRequest) -> LocalBoxFuture<'static, FetchResult<HttpResponse>>;
}

/// Everything outside the engine that the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
	pub runtime: Rc<dyn Runtime>,
	pub fetcher: Rc<dyn Fetcher>,
	pub engines: Rc<dyn super::engine::EngineFactory>,
}
