use wasm_bindgen::prelude::*;

pub mod health;
pub mod hls;

mod player;
mod tracing_wasm;

#[cfg(test)]
mod tests;

#[wasm_bindgen(start)]
pub fn main() {
	console_error_panic_hook::set_once();
	tracing_wasm::set_as_global_default();

	tracing::trace!("live player loaded");
}
