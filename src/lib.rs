//! tweetreel turns a social-media post into a vertical video.
//!
//! A card image (avatar, display name, handle, caption) is rendered on the CPU and composited
//! over the post's video after it has been reframed to the target aspect ratio:
//!
//! - Acquire the source with a [`SourceProvider`] (or use a local file)
//! - Render the card with a [`CardRenderer`]
//! - Reframe the probed [`VideoAsset`] and stream composited frames into a [`FrameSink`]
//!
//! [`Pipeline`] sequences all of it inside a per-run temporary workspace.
#![forbid(unsafe_code)]

mod foundation;

pub mod acquire;
pub mod card;
pub mod encode;
pub mod media;
pub mod overlay;
pub mod pipeline;
pub mod raster;

pub use crate::foundation::core::{Fps, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{ErrorKind, ReelError, ReelResult};

pub use crate::acquire::avatar::{AvatarFetcher, HttpAvatarFetcher, MAX_AVATAR_BYTES, is_remote_ref};
pub use crate::acquire::source::{AcquiredSource, LocalSource, SourceProvider, YtDlpProvider};
pub use crate::card::metadata::TweetMetadata;
pub use crate::card::renderer::{
    AvatarSlot, CardConfig, CardRenderer, EllipsisPolicy, RenderedCard, TextSlot,
    truncate_caption,
};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, AudioMode, FrameSink, InMemorySink, SinkConfig};
pub use crate::media::decode::FrameReader;
pub use crate::media::probe::{VideoAsset, probe_video};
pub use crate::media::reframe::{ReframePlan, VideoFilter, reframe};
pub use crate::overlay::{CompositeOptions, CompositeStats, Placement, TimedLayer, composite};
pub use crate::pipeline::cancel::CancelToken;
pub use crate::pipeline::config::{EncodeConfig, PipelineConfig};
pub use crate::pipeline::orchestrator::{CompositionResult, Pipeline};
pub use crate::raster::buffer::{Mask, RasterImage};
pub use crate::raster::text::FontSource;
