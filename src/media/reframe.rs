use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::probe::VideoAsset;

/// One decode-time geometry step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoFilter {
    Scale {
        width: u32,
        height: u32,
    },
    Crop {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    },
    Pad {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
        color: Rgba8,
    },
}

impl VideoFilter {
    /// Render as an ffmpeg filtergraph element.
    pub fn to_ffmpeg(&self) -> String {
        match self {
            Self::Scale { width, height } => format!("scale={width}:{height}:flags=bicubic"),
            Self::Crop {
                width,
                height,
                x,
                y,
            } => format!("crop={width}:{height}:{x}:{y}"),
            Self::Pad {
                width,
                height,
                x,
                y,
                color,
            } => format!(
                "pad={width}:{height}:{x}:{y}:color=0x{:02X}{:02X}{:02X}",
                color.r, color.g, color.b
            ),
        }
    }
}

/// Geometry of fitting a source to a target by matching heights.
///
/// The source is scaled uniformly to the target height, then center-cropped when too wide or
/// centered on black bars when too narrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReframePlan {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub scaled_width: u32,
    /// Left offset into the scaled frame; non-zero only when cropping.
    pub crop_x: u32,
    /// Left offset of the scaled frame on the target; non-zero only when padding.
    pub pad_x: u32,
}

impl ReframePlan {
    pub fn new(
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> ReelResult<Self> {
        if source_width == 0 || source_height == 0 {
            return Err(ReelError::geometry(source_width, source_height));
        }
        if target_width == 0 || target_height == 0 {
            return Err(ReelError::geometry(target_width, target_height));
        }

        let scaled = (f64::from(source_width) * f64::from(target_height)
            / f64::from(source_height))
        .round();
        if scaled > f64::from(u32::MAX) {
            return Err(ReelError::geometry(source_width, source_height));
        }
        let scaled_width = (scaled as u32).max(1);

        let (crop_x, pad_x) = if scaled_width > target_width {
            ((scaled_width - target_width) / 2, 0)
        } else {
            (0, (target_width - scaled_width) / 2)
        };

        Ok(Self {
            source_width,
            source_height,
            target_width,
            target_height,
            scaled_width,
            crop_x,
            pad_x,
        })
    }

    pub fn crops(&self) -> bool {
        self.scaled_width > self.target_width
    }

    pub fn pads(&self) -> bool {
        self.scaled_width < self.target_width
    }

    /// Filters that realize this plan. Identity steps are omitted.
    pub fn filters(&self) -> Vec<VideoFilter> {
        let mut out = Vec::with_capacity(2);
        if (self.scaled_width, self.target_height) != (self.source_width, self.source_height) {
            out.push(VideoFilter::Scale {
                width: self.scaled_width,
                height: self.target_height,
            });
        }
        if self.crops() {
            out.push(VideoFilter::Crop {
                width: self.target_width,
                height: self.target_height,
                x: self.crop_x,
                y: 0,
            });
        } else if self.pads() {
            out.push(VideoFilter::Pad {
                width: self.target_width,
                height: self.target_height,
                x: self.pad_x,
                y: 0,
                color: Rgba8::BLACK,
            });
        }
        out
    }
}

/// Reframe `video` to exactly `target_width` x `target_height`.
///
/// Lazy: the returned asset carries the filter chain and the target geometry; frames are
/// transformed when decoded. Duration, frame rate and audio are unchanged.
pub fn reframe(video: &VideoAsset, target_width: u32, target_height: u32) -> ReelResult<VideoAsset> {
    let plan = ReframePlan::new(video.width, video.height, target_width, target_height)?;
    tracing::debug!(
        from = ?(video.width, video.height),
        to = ?(target_width, target_height),
        scaled_width = plan.scaled_width,
        crop_x = plan.crop_x,
        pad_x = plan.pad_x,
        "reframe plan"
    );

    let mut filters = video.filters.clone();
    filters.extend(plan.filters());
    Ok(VideoAsset {
        filters,
        width: target_width,
        height: target_height,
        ..video.clone()
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/reframe.rs"]
mod tests;
