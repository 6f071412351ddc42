// Console output adapted from https://github.com/old-storyai/tracing-wasm, with a level that can change at runtime.

use core::fmt::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use web_sys::console;

static MAX_LEVEL: AtomicU8 = AtomicU8::new(level_to_u8(tracing::Level::INFO));

const fn level_to_u8(level: tracing::Level) -> u8 {
	match level {
		tracing::Level::ERROR => 0,
		tracing::Level::WARN => 1,
		tracing::Level::INFO => 2,
		tracing::Level::DEBUG => 3,
		tracing::Level::TRACE => 4,
	}
}

/// Every player shares the console, the most recently created one decides the level.
pub fn set_max_level(level: tracing::Level) {
	MAX_LEVEL.store(level_to_u8(level), Ordering::Relaxed);
}

fn level_enabled(level: &tracing::Level) -> bool {
	level_to_u8(*level) <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Writes events to the devtools console, coloured by level.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLayer;

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for ConsoleLayer {
	fn enabled(&self, metadata: &tracing::Metadata<'_>, _: Context<'_, S>) -> bool {
		level_enabled(metadata.level())
	}

	fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &tracing::Id, ctx: Context<'_, S>) {
		let mut recorder = StringRecorder::default();
		attrs.record(&mut recorder);

		if let Some(span_ref) = ctx.span(id) {
			span_ref.extensions_mut().insert(recorder);
		}
	}

	fn on_record(&self, id: &tracing::Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
		if let Some(span_ref) = ctx.span(id) {
			if let Some(recorder) = span_ref.extensions_mut().get_mut::<StringRecorder>() {
				values.record(recorder);
			}
		}
	}

	fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
		let mut recorder = StringRecorder::default();
		event.record(&mut recorder);

		let meta = event.metadata();
		let level = meta.level();

		let origin = meta
			.file()
			.and_then(|file| meta.line().map(|ln| format!("{}:{}", file, ln)))
			.unwrap_or_default();

		let spans = ctx
			.event_scope(event)
			.map(|scope| {
				scope
					.from_root()
					.map(|span| span.name())
					.collect::<Vec<_>>()
					.join(":")
			})
			.unwrap_or_default();

		let console_fn = match *level {
			tracing::Level::TRACE | tracing::Level::DEBUG => console::debug_4,
			tracing::Level::INFO => console::info_4,
			tracing::Level::WARN => console::warn_4,
			tracing::Level::ERROR => console::error_4,
		};

		let style = match *level {
			tracing::Level::TRACE => "color: dodgerblue; background: #444",
			tracing::Level::DEBUG => "color: lawngreen; background: #444",
			tracing::Level::INFO => "color: whitesmoke; background: #444",
			tracing::Level::WARN => "color: orange; background: #444",
			tracing::Level::ERROR => "color: red; background: #444",
		};

		console_fn(
			&format!("%c{}%c {} {}%c{}", level, origin, spans, recorder).into(),
			&style.into(),
			&"color: gray; font-style: italic".into(),
			&"color: inherit".into(),
		);
	}
}

/// Installs the console layer as the global subscriber.
pub fn set_as_global_default() {
	if tracing::subscriber::set_global_default(Registry::default().with(ConsoleLayer)).is_err() {
		console::warn_1(&"a global tracing subscriber is already installed".into());
	}
}

#[derive(Default)]
struct StringRecorder {
	display: String,
	is_following_args: bool,
}

impl Visit for StringRecorder {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			if self.display.is_empty() {
				self.display = format!("{:?}", value);
			} else {
				self.display = format!("{:?}\n{}", value, self.display);
			}
			return;
		}

		let separator = if self.is_following_args { "\n" } else { " " };
		self.is_following_args = true;
		write!(self.display, "{}{} = {:?};", separator, field.name(), value).ok();
	}
}

impl fmt::Display for StringRecorder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.display.is_empty() {
			Ok(())
		} else {
			write!(f, " {}", self.display)
		}
	}
}
