use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use live_player_types::{SourceFormat, StreamLines, StreamSource};
use tokio::sync::mpsc;

use crate::health::{
	Collaborators, DecoderEngine, EngineError, EngineEvent, EngineEventSender, EngineFactory, ErrorKind, FetchError,
	FetchResult, Fetcher, HealthConfig, HttpRequest, HttpResponse, LocalBoxFuture, Runtime, SessionController, SetupError,
	StatusEvent,
};

pub const HLS_URL: &str = "https://cdn.example.com/live/stream.m3u8";
pub const FLV_URL: &str = "https://cdn.example.com/live/stream.flv";
pub const BACKUP_HLS_URL: &str = "https://backup.example.com/live/stream.m3u8";

pub fn media_playlist(sequence: u32, segments: &[&str]) -> String {
	let mut text = format!("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n#EXT-X-MEDIA-SEQUENCE:{sequence}\n");
	for segment in segments {
		text.push_str("#EXTINF:2.000,\n");
		text.push_str(segment);
		text.push('\n');
	}
	text
}

pub fn fatal(kind: ErrorKind) -> EngineEvent {
	EngineEvent::Error(EngineError::new(kind, true).with_detail("test"))
}

pub fn not_found() -> EngineEvent {
	EngineEvent::Error(EngineError::new(ErrorKind::ManifestLoad, true).with_status(Some(404)))
}

pub fn stalled() -> EngineEvent {
	EngineEvent::Error(EngineError::new(ErrorKind::BufferStalled, false))
}

pub struct FakeRuntime;

impl Runtime for FakeRuntime {
	fn spawn(&self, fut: LocalBoxFuture<'static, ()>) {
		tokio::task::spawn_local(fut);
	}

	fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
		Box::pin(tokio::time::sleep(Duration::from_millis(ms as u64)))
	}
}

/// Answers from a per url script. The last scripted answer repeats forever.
#[derive(Default)]
pub struct ScriptedFetcher {
	responses: RefCell<HashMap<String, VecDeque<FetchResult<HttpResponse>>>>,
	requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedFetcher {
	pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) {
		self.script(url, vec![Ok(HttpResponse::new(status, body))]);
	}

	pub fn respond_sequence(&self, url: &str, bodies: &[String]) {
		self.script(url, bodies.iter().map(|body| Ok(HttpResponse::new(200, body.clone()))).collect());
	}

	pub fn fail(&self, url: &str, err: FetchError) {
		self.script(url, vec![Err(err)]);
	}

	pub fn script(&self, url: &str, responses: Vec<FetchResult<HttpResponse>>) {
		self.responses.borrow_mut().insert(url.to_string(), responses.into());
	}

	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.borrow().clone()
	}

	pub fn count(&self, url: &str) -> usize {
		self.requests.borrow().iter().filter(|req| req.url == url).count()
	}
}

impl Fetcher for ScriptedFetcher {
	fn fetch(&self, request: HttpRequest) -> LocalBoxFuture<'static, FetchResult<HttpResponse>> {
		let result = {
			let mut responses = self.responses.borrow_mut();
			match responses.get_mut(&request.url) {
				Some(queue) if queue.len() > 1 => queue.pop_front().expect("queue is not empty"),
				Some(queue) => queue.front().cloned().expect("scripted urls have a response"),
				None => Err(FetchError::Network(format!("no script for {}", request.url))),
			}
		};

		self.requests.borrow_mut().push(request);
		Box::pin(std::future::ready(result))
	}
}

#[derive(Debug)]
pub struct EngineRecord {
	pub format: SourceFormat,
	pub loaded: Option<String>,
	pub stop_loads: u32,
	pub destroyed: bool,
	pub events: EngineEventSender,
	pub media_playlist: Option<String>,
}

struct FakeEngine(Rc<RefCell<EngineRecord>>);

impl DecoderEngine for FakeEngine {
	fn load(&mut self, url: &str) -> Result<(), SetupError> {
		self.0.borrow_mut().loaded = Some(url.to_string());
		Ok(())
	}

	fn stop_load(&mut self) {
		self.0.borrow_mut().stop_loads += 1;
	}

	fn destroy(&mut self) {
		self.0.borrow_mut().destroyed = true;
	}

	fn active_media_playlist(&self) -> Option<String> {
		self.0.borrow().media_playlist.clone()
	}
}

pub struct FakeEngineFactory {
	supported: Vec<SourceFormat>,
	media_playlist: RefCell<Option<String>>,
	fail_create: Cell<bool>,
	engines: RefCell<Vec<Rc<RefCell<EngineRecord>>>>,
}

impl FakeEngineFactory {
	pub fn new(supported: &[SourceFormat]) -> Self {
		Self {
			supported: supported.to_vec(),
			media_playlist: RefCell::new(None),
			fail_create: Cell::new(false),
			engines: RefCell::new(Vec::new()),
		}
	}

	pub fn set_media_playlist(&self, url: Option<&str>) {
		*self.media_playlist.borrow_mut() = url.map(str::to_string);
	}

	pub fn fail_create(&self, fail: bool) {
		self.fail_create.set(fail);
	}

	pub fn count(&self) -> usize {
		self.engines.borrow().len()
	}

	pub fn engine(&self, index: usize) -> Rc<RefCell<EngineRecord>> {
		self.engines.borrow()[index].clone()
	}

	pub fn last(&self) -> Rc<RefCell<EngineRecord>> {
		self.engines.borrow().last().cloned().expect("no engine was created")
	}

	/// Sends `event` from the newest engine.
	pub fn emit(&self, event: EngineEvent) {
		self.last().borrow().events.send(event).ok();
	}
}

impl EngineFactory for FakeEngineFactory {
	fn supports(&self, format: SourceFormat) -> bool {
		self.supported.contains(&format)
	}

	fn create(&self, format: SourceFormat, events: EngineEventSender) -> Result<Box<dyn DecoderEngine>, SetupError> {
		if self.fail_create.get() {
			return Err(SetupError::Engine("decoder unavailable".into()));
		}

		let record = Rc::new(RefCell::new(EngineRecord {
			format,
			loaded: None,
			stop_loads: 0,
			destroyed: false,
			events,
			media_playlist: self.media_playlist.borrow().clone(),
		}));

		self.engines.borrow_mut().push(record.clone());
		Ok(Box::new(FakeEngine(record)))
	}
}

pub struct Harness {
	pub controller: SessionController,
	pub status: mpsc::UnboundedReceiver<StatusEvent>,
	pub fetcher: Rc<ScriptedFetcher>,
	pub engines: Rc<FakeEngineFactory>,
}

impl Harness {
	pub fn new(lines: Vec<StreamSource>) -> Self {
		Self::with_config(HealthConfig::default(), lines, &[SourceFormat::Hls, SourceFormat::Flv, SourceFormat::Other])
	}

	pub fn with_config(config: HealthConfig, lines: Vec<StreamSource>, supported: &[SourceFormat]) -> Self {
		let fetcher = Rc::new(ScriptedFetcher::default());
		let engines = Rc::new(FakeEngineFactory::new(supported));

		let collaborators = Collaborators {
			runtime: Rc::new(FakeRuntime),
			fetcher: fetcher.clone(),
			engines: engines.clone(),
		};

		let lines = StreamLines::new(lines).expect("valid lines");
		let (controller, status) = SessionController::new(config, lines, collaborators);

		Self {
			controller,
			status,
			fetcher,
			engines,
		}
	}

	pub fn hls() -> Self {
		Self::new(vec![StreamSource::new("main", HLS_URL)])
	}

	pub fn statuses(&mut self) -> Vec<StatusEvent> {
		let mut statuses = Vec::new();
		while let Ok(status) = self.status.try_recv() {
			statuses.push(status);
		}
		statuses
	}

	pub fn offline_count(statuses: &[StatusEvent]) -> usize {
		statuses
			.iter()
			.filter(|status| matches!(status, StatusEvent::Offline { .. }))
			.count()
	}
}

/// Lets every spawned task run until it blocks on a timer.
pub async fn settle() {
	for _ in 0..16 {
		tokio::task::yield_now().await;
	}
}

pub async fn advance(ms: u64) {
	tokio::time::sleep(Duration::from_millis(ms)).await;
	settle().await;
}

pub async fn run_local<F: Future>(fut: F) -> F::Output {
	tokio::task::LocalSet::new().run_until(fut).await
}
