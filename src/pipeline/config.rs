use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::card::renderer::CardConfig;
use crate::encode::sink::AudioMode;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::CompositeOptions;

/// Output encoding options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub video_codec: String,
    pub audio: AudioMode,
    /// Flattening color for any translucent output pixel.
    pub background: Rgba8,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio: AudioMode::Copy,
            background: Rgba8::BLACK,
        }
    }
}

/// Everything a [`Pipeline`](crate::pipeline::orchestrator::Pipeline) run needs besides its inputs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub card: CardConfig,
    pub encode: EncodeConfig,
    /// Bound on every network operation (avatar fetch, `yt-dlp` socket timeout).
    pub fetch_timeout_secs: u64,
    /// Parent of the per-run scratch directories; the system temp dir when unset.
    pub work_root: Option<PathBuf>,
    pub parallel: bool,
    pub chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let composite = CompositeOptions::default();
        Self {
            target_width: 1080,
            target_height: 1920,
            card: CardConfig::default(),
            encode: EncodeConfig::default(),
            fetch_timeout_secs: 30,
            work_root: None,
            parallel: composite.parallel,
            chunk_size: composite.chunk_size,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config json '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ReelError::validation("target width/height must be non-zero"));
        }
        if !self.target_width.is_multiple_of(2) || !self.target_height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "target width/height must be even (yuv420p output)",
            ));
        }
        if self.chunk_size == 0 {
            return Err(ReelError::validation("chunk_size must be > 0"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ReelError::validation("fetch_timeout_secs must be > 0"));
        }
        if self.encode.video_codec.trim().is_empty() {
            return Err(ReelError::validation("encode.video_codec must not be empty"));
        }
        self.card.validate()
    }

    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions {
            parallel: self.parallel,
            chunk_size: self.chunk_size,
        }
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
