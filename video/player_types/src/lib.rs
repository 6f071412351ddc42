mod stream_source;

pub use stream_source::*;
