mod manifest;
mod normalize;

pub use manifest::{is_media_playlist, media_playlist_reference, resolve_uri};
pub use normalize::normalize;
