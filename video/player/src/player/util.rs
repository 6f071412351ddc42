use std::ops::Deref;

use wasm_bindgen::JsCast;

pub type Cleanup = Box<dyn FnOnce(&web_sys::EventTarget)>;

/// A js object with event listeners attached. The listeners are removed when the holder drops.
pub struct Holder<T: JsCast> {
	inner: T,
	cleanup: Option<Cleanup>,
}

impl<T: JsCast> Holder<T> {
	pub fn new(inner: T, cleanup: Cleanup) -> Self {
		Self {
			inner,
			cleanup: Some(cleanup),
		}
	}
}

impl<T: JsCast> Deref for Holder<T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		&self.inner
	}
}

impl<T: JsCast> Drop for Holder<T> {
	fn drop(&mut self) {
		if let Some(cleanup) = self.cleanup.take() {
			cleanup(self.inner.unchecked_ref());
		}
	}
}

macro_rules! register_events {
	($ob:expr, {
		$(
			$($evt:literal)|+ => $body:expr
		),* $(,)?
	}) => {
		{
			let target: &web_sys::EventTarget = $ob.as_ref();
			let mut handlers = Vec::new();
			$(
				let cb = wasm_bindgen::closure::Closure::<dyn FnMut(web_sys::Event)>::new($body);
				$(
					if let Err(err) = target.add_event_listener_with_callback($evt, cb.as_ref().unchecked_ref()) {
						tracing::warn!("failed to add {} listener: {:?}", $evt, err);
					}
				)+
				handlers.push((vec![$($evt),+], cb));
			)*

			Box::new(move |target: &web_sys::EventTarget| {
				for (evts, cb) in handlers.drain(..) {
					for evt in evts {
						target.remove_event_listener_with_callback(evt, cb.as_ref().unchecked_ref()).ok();
					}
				}
			}) as $crate::player::util::Cleanup
		}
	};
}

pub(crate) use register_events;
