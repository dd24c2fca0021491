//! Timed overlay compositing onto decoded video frames.

use rayon::prelude::*;

use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::decode::FrameReader;
use crate::media::probe::VideoAsset;
use crate::pipeline::cancel::CancelToken;
use crate::raster::buffer::RasterImage;
use crate::raster::composite::paste;

/// Where a layer sits on the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    /// Centered on both axes; odd leftovers go right/bottom.
    #[default]
    Center,
    /// Top-left corner at a fixed offset.
    At { x: i64, y: i64 },
}

impl Placement {
    fn origin(self, frame: (u32, u32), layer: (u32, u32)) -> (i64, i64) {
        match self {
            Self::Center => (
                (i64::from(frame.0) - i64::from(layer.0)) / 2,
                (i64::from(frame.1) - i64::from(layer.1)) / 2,
            ),
            Self::At { x, y } => (x, y),
        }
    }
}

/// A still image shown over the video during `[start_secs, start_secs + duration_secs)`.
#[derive(Clone, Debug)]
pub struct TimedLayer {
    pub image: RasterImage,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub placement: Placement,
}

impl TimedLayer {
    pub fn centered(image: RasterImage, start_secs: f64, duration_secs: f64) -> Self {
        Self {
            image,
            start_secs,
            duration_secs,
            placement: Placement::Center,
        }
    }

    pub fn is_active(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.start_secs + self.duration_secs
    }

    /// Source-over the layer onto `frame` if it is visible at time `t`.
    pub fn apply(&self, frame: &mut RasterImage, t: f64) -> bool {
        if !self.is_active(t) {
            return false;
        }
        let (x, y) = self.placement.origin(
            (frame.width(), frame.height()),
            (self.image.width(), self.image.height()),
        );
        paste(frame, &self.image, x, y);
        true
    }
}

/// Chunking and parallelism of the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Composite frames of a chunk on the rayon pool.
    pub parallel: bool,
    /// Frames decoded before compositing and handing them to the sink.
    pub chunk_size: usize,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_size: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub frames: u64,
    pub frames_with_overlay: u64,
}

/// Composite `layer` onto every frame of `frames` in place.
pub fn composite_chunk(
    frames: &mut [(FrameIndex, RasterImage)],
    layer: &TimedLayer,
    fps: Fps,
    parallel: bool,
) -> u64 {
    let apply = |(idx, frame): &mut (FrameIndex, RasterImage)| {
        u64::from(layer.apply(frame, fps.frame_time_secs(*idx)))
    };
    if parallel {
        frames.par_iter_mut().map(apply).sum()
    } else {
        frames.iter_mut().map(apply).sum()
    }
}

/// Decode `video`, overlay `overlay` centered for `duration_secs` from the start, and stream the
/// result into `sink`.
///
/// Frame rate and geometry are taken from `video`; `audio` is handed to the sink unchanged.
/// Frames reach the sink in ascending order. `cancel` is checked before every chunk.
#[tracing::instrument(skip_all, fields(w = video.width, h = video.height, duration = duration_secs))]
pub fn composite(
    video: &VideoAsset,
    overlay: &RasterImage,
    duration_secs: f64,
    audio: Option<AudioInputConfig>,
    sink: &mut dyn FrameSink,
    opts: CompositeOptions,
    cancel: &CancelToken,
) -> ReelResult<CompositeStats> {
    if opts.chunk_size == 0 {
        return Err(ReelError::validation("composite chunk_size must be > 0"));
    }
    let layer = TimedLayer::centered(overlay.clone(), 0.0, duration_secs);
    let mut reader = FrameReader::open(video)?;

    sink.begin(SinkConfig {
        width: video.width,
        height: video.height,
        fps: video.fps,
        audio,
    })?;

    let mut stats = CompositeStats::default();
    loop {
        cancel.check()?;
        let mut chunk = reader.next_chunk(opts.chunk_size)?;
        if chunk.is_empty() {
            break;
        }
        stats.frames_with_overlay += composite_chunk(&mut chunk, &layer, video.fps, opts.parallel);
        for (idx, frame) in &chunk {
            sink.push_frame(*idx, frame)?;
        }
        stats.frames += chunk.len() as u64;
    }

    if stats.frames == 0 {
        return Err(ReelError::encode("source video produced no frames"));
    }
    sink.end()?;
    tracing::info!(
        frames = stats.frames,
        with_overlay = stats.frames_with_overlay,
        "composited video"
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/mod.rs"]
mod tests;
