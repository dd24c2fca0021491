use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::raster::buffer::RasterImage;

/// How the source audio reaches the output container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    /// Stream-copy the source audio unmodified.
    #[default]
    Copy,
    /// Re-encode to AAC.
    Aac,
}

/// Audio track muxed alongside the frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInputConfig {
    /// Media file whose first audio stream is used.
    pub path: PathBuf,
    /// Copy or re-encode.
    pub mode: AudioMode,
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Audio to mux, or `None` for a video-only file.
    pub audio: Option<AudioInputConfig>,
}

/// Consumer of composited frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order between one `begin` and
/// one `end`.
pub trait FrameSink: Send {
    /// Prepare for a new stream with the given geometry and audio.
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    /// Accept the next frame (premultiplied RGBA8 at the configured size).
    fn push_frame(&mut self, idx: FrameIndex, frame: &RasterImage) -> ReelResult<()>;
    /// Finish the stream and flush any output.
    fn end(&mut self) -> ReelResult<()>;
}

/// Keeps every frame in memory. For tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, RasterImage)>,
    ended: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration passed to the last `begin`.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Frames received since the last `begin`, in push order.
    pub fn frames(&self) -> &[(FrameIndex, RasterImage)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RasterImage) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encode("in-memory sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(ReelError::encode("sink received out-of-order frame index"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        self.ended = true;
        Ok(())
    }
}
