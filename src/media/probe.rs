use std::path::{Path, PathBuf};

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::reframe::VideoFilter;

/// A decodable video stream plus the geometry its frames will have once decoded.
///
/// `filters` are applied in order while decoding; `width`/`height` describe the frames after
/// the last filter. The source file itself is never modified.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoAsset {
    /// File frames (and audio) are read from.
    pub source_path: PathBuf,
    /// Decode-time filter chain.
    pub filters: Vec<VideoFilter>,
    /// Display width, after any container rotation.
    pub width: u32,
    /// Display height, after any container rotation.
    pub height: u32,
    pub duration_sec: f64,
    pub fps: Fps,
    pub has_audio: bool,
}

impl VideoAsset {
    /// Frames expected when decoding the whole stream.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_ceil(self.duration_sec)
    }

    /// The filter chain as an ffmpeg `-vf` argument, if any.
    pub fn filter_graph(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        Some(
            self.filters
                .iter()
                .map(VideoFilter::to_ffmpeg)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    tags: Option<ProbeTags>,
}

impl ProbeStream {
    /// Display rotation in degrees, from the display matrix or the legacy `rotate` tag.
    fn rotation(&self) -> f64 {
        self.side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0)
    }

    /// Whether decoded frames come out with width and height swapped.
    fn is_quarter_turn(&self) -> bool {
        let rotation = self.rotation();
        rotation.is_finite() && (rotation.round() as i64).rem_euclid(180) == 90
    }
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe a media file with `ffprobe`.
#[tracing::instrument]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoAsset> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::acquisition(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::acquisition(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let asset = parse_probe_json(source_path, &out.stdout)?;
    tracing::debug!(
        width = asset.width,
        height = asset.height,
        duration = asset.duration_sec,
        fps = asset.fps.as_f64(),
        has_audio = asset.has_audio,
        "probed source video"
    );
    Ok(asset)
}

pub(crate) fn parse_probe_json(source_path: &Path, json: &[u8]) -> ReelResult<VideoAsset> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| ReelError::acquisition(format!("ffprobe json parse failed: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ReelError::acquisition(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;

    let coded_width = video.width.unwrap_or(0);
    let coded_height = video.height.unwrap_or(0);
    if coded_width == 0 || coded_height == 0 {
        return Err(ReelError::geometry(coded_width, coded_height));
    }
    // ffmpeg autorotates on decode, so plan against the displayed orientation.
    let (width, height) = if video.is_quarter_turn() {
        (coded_height, coded_width)
    } else {
        (coded_width, coded_height)
    };

    let fps = [video.r_frame_rate.as_deref(), video.avg_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(Fps::parse_ratio)
        .ok_or_else(|| ReelError::acquisition("video stream has no usable frame rate"))?;

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ReelError::acquisition("video has no usable duration"))?;

    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoAsset {
        source_path: source_path.to_path_buf(),
        filters: Vec::new(),
        width,
        height,
        duration_sec,
        fps,
        has_audio,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
