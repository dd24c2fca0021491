//! Source video probing, reframing and frame decoding via the system `ffmpeg`/`ffprobe`.

pub mod decode;
pub mod probe;
pub mod reframe;
