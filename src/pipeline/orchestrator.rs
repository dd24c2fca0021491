use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::acquire::avatar::{AvatarFetcher, HttpAvatarFetcher, is_remote_ref};
use crate::acquire::source::{AcquiredSource, LocalSource, SourceProvider, YtDlpProvider};
use crate::card::metadata::TweetMetadata;
use crate::card::renderer::CardRenderer;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, require_ffmpeg_tools};
use crate::encode::sink::AudioInputConfig;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::probe::{VideoAsset, probe_video};
use crate::media::reframe::reframe;
use crate::overlay::composite;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::config::PipelineConfig;

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionResult {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Duration of the written file, as probed.
    pub duration_secs: f64,
    pub frames: u64,
    pub fps: Fps,
    /// Set when the card was drawn with the placeholder avatar.
    pub avatar_placeholder: bool,
}

/// Which avatar references a run may resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AvatarRefs {
    /// Metadata came from a remote source: network references only.
    RemoteOnly,
    /// Metadata came from the caller: local paths are fine too.
    LocalAllowed,
}

/// Sequences acquisition, card rendering, reframing, compositing and encoding.
///
/// Each run works inside its own temporary directory, removed when the run returns. The output
/// path is only written once the encode has succeeded.
pub struct Pipeline {
    config: PipelineConfig,
    renderer: CardRenderer,
    provider: Box<dyn SourceProvider>,
    avatars: Box<dyn AvatarFetcher>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Pipeline with the `yt-dlp` provider and the HTTP avatar fetcher.
    pub fn new(config: PipelineConfig) -> ReelResult<Self> {
        config.validate()?;
        let timeout = config.fetch_timeout();
        let renderer = CardRenderer::new(config.card.clone())?;
        Ok(Self {
            renderer,
            provider: Box::new(YtDlpProvider::new(timeout)),
            avatars: Box::new(HttpAvatarFetcher::new(timeout)?),
            cancel: CancelToken::new(),
            config,
        })
    }

    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn with_avatar_fetcher(mut self, fetcher: impl AvatarFetcher + 'static) -> Self {
        self.avatars = Box::new(fetcher);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Token that cancels in-flight runs of this pipeline.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Acquire `reference` through the configured provider and render it to `out_path`.
    #[tracing::instrument(skip(self, out_path), fields(out = %out_path.display()))]
    pub fn run(&mut self, reference: &str, out_path: &Path) -> ReelResult<CompositionResult> {
        require_ffmpeg_tools().map_err(|e| e.in_stage("preflight"))?;
        let workdir = self.workspace().map_err(|e| e.in_stage("preflight"))?;
        self.cancel.check()?;

        let acquired = self
            .provider
            .fetch(reference, workdir.path())
            .map_err(|e| e.in_stage("acquire"))?;
        self.run_acquired(acquired, AvatarRefs::RemoteOnly, workdir.path(), out_path)
    }

    /// Render a video already on disk with caller-supplied metadata.
    #[tracing::instrument(skip(self, metadata, out_path), fields(out = %out_path.display()))]
    pub fn run_local(
        &mut self,
        video_path: &Path,
        metadata: TweetMetadata,
        out_path: &Path,
    ) -> ReelResult<CompositionResult> {
        require_ffmpeg_tools().map_err(|e| e.in_stage("preflight"))?;
        let workdir = self.workspace().map_err(|e| e.in_stage("preflight"))?;
        self.cancel.check()?;

        let reference = video_path.to_string_lossy();
        let acquired = LocalSource { metadata }
            .fetch(&reference, workdir.path())
            .map_err(|e| e.in_stage("acquire"))?;
        self.run_acquired(acquired, AvatarRefs::LocalAllowed, workdir.path(), out_path)
    }

    fn workspace(&self) -> ReelResult<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tweetreel-");
        let dir = match &self.config.work_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("create work root '{}'", root.display()))?;
                builder
                    .tempdir_in(root)
                    .with_context(|| format!("create run workspace in '{}'", root.display()))?
            }
            None => builder.tempdir().context("create run workspace")?,
        };
        tracing::debug!(workdir = %dir.path().display(), "run workspace created");
        Ok(dir)
    }

    /// Resolve the avatar bytes, or the error that sends the card to the placeholder.
    fn fetch_avatar(
        &self,
        metadata: &TweetMetadata,
        refs: AvatarRefs,
    ) -> (Option<Vec<u8>>, Option<ReelError>) {
        let Some(avatar_ref) = metadata.avatar_ref.as_deref() else {
            return (None, None);
        };
        let fetched = if refs == AvatarRefs::RemoteOnly && !is_remote_ref(avatar_ref) {
            Err(ReelError::avatar_unavailable(
                "acquired metadata may only reference http(s) avatars",
            ))
        } else {
            self.avatars.fetch_bytes(avatar_ref)
        };
        match fetched {
            Ok(bytes) => (Some(bytes), None),
            Err(err) => {
                tracing::warn!(error = %err, "avatar fetch failed");
                (None, Some(err))
            }
        }
    }

    fn run_acquired(
        &mut self,
        acquired: AcquiredSource,
        refs: AvatarRefs,
        workdir: &Path,
        out_path: &Path,
    ) -> ReelResult<CompositionResult> {
        let AcquiredSource {
            video_path,
            metadata,
        } = acquired;

        self.cancel.check()?;
        let (avatar_bytes, fetch_error) = self.fetch_avatar(&metadata, refs);

        let mut card = self
            .renderer
            .render_card(&metadata, avatar_bytes.as_deref())
            .map_err(|e| e.in_stage("card"))?;
        if fetch_error.is_some() {
            card.avatar_unavailable = fetch_error;
        }
        card.write_png(&workdir.join("card.png"))
            .map_err(|e| e.in_stage("card"))?;

        self.cancel.check()?;
        let source = probe_video(&video_path).map_err(|e| e.in_stage("probe"))?;
        let framed = reframe(
            &source,
            self.config.target_width,
            self.config.target_height,
        )
        .map_err(|e| e.in_stage("reframe"))?;

        self.cancel.check()?;
        let staged = workdir.join("output.mp4");
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            background: self.config.encode.background,
            video_codec: self.config.encode.video_codec.clone(),
            ..FfmpegSinkOpts::new(&staged)
        });
        let audio = source.has_audio.then(|| AudioInputConfig {
            path: source.source_path.clone(),
            mode: self.config.encode.audio,
        });
        let stats = composite(
            &framed,
            &card.image,
            framed.duration_sec,
            audio,
            &mut sink,
            self.config.composite_options(),
            &self.cancel,
        )
        .map_err(|e| e.in_stage("composite"))?;
        if sink.frames_written() != stats.frames {
            return Err(ReelError::encode(format!(
                "encoder received {} of {} frames",
                sink.frames_written(),
                stats.frames
            ))
            .in_stage("composite"));
        }

        self.cancel.check()?;
        let written = finalize(&staged, out_path).map_err(|e| e.in_stage("finalize"))?;

        let result = CompositionResult {
            path: out_path.to_path_buf(),
            width: written.width,
            height: written.height,
            duration_secs: written.duration_sec,
            frames: stats.frames,
            fps: framed.fps,
            avatar_placeholder: card.used_placeholder(),
        };
        tracing::info!(
            path = %result.path.display(),
            duration = result.duration_secs,
            frames = result.frames,
            placeholder = result.avatar_placeholder,
            "reel written"
        );
        Ok(result)
    }
}

/// Check that the staged encode is a readable video, then publish it to `out_path`.
///
/// Nothing is written to `out_path` unless the staged file probes cleanly.
fn finalize(staged: &Path, out_path: &Path) -> ReelResult<VideoAsset> {
    let written = probe_video(staged)
        .map_err(|e| ReelError::encode(format!("encoded output is unreadable: {e}")))?;
    publish(staged, out_path)?;
    Ok(written)
}

/// Move the finished encode to its destination, copying when a rename is not possible.
fn publish(staged: &Path, out_path: &Path) -> ReelResult<()> {
    ensure_parent_dir(out_path)?;
    match std::fs::rename(staged, out_path) {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::debug!(error = %err, "rename failed, copying output into place");
            copy_into_place(staged, out_path)
        }
    }
}

/// Copy through a sibling temp file that is persisted over `out_path` in one rename.
///
/// The temp file is removed on any failure, so `out_path` is either untouched or complete.
fn copy_into_place(staged: &Path, out_path: &Path) -> ReelResult<()> {
    let parent = match out_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".tweetreel-")
        .suffix(".part")
        .tempfile_in(parent)
        .with_context(|| format!("create temp file in '{}'", parent.display()))?;
    let mut src = std::fs::File::open(staged)
        .with_context(|| format!("open staged output '{}'", staged.display()))?;
    std::io::copy(&mut src, tmp.as_file_mut())
        .with_context(|| format!("copy '{}' to '{}'", staged.display(), out_path.display()))?;
    tmp.as_file()
        .sync_all()
        .context("flush copied output")?;
    tmp.persist(out_path)
        .map_err(|e| e.error)
        .with_context(|| format!("persist output to '{}'", out_path.display()))?;
    Ok(())
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
