use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::card::metadata::TweetMetadata;
use crate::foundation::error::{ReelError, ReelResult};

/// A fetched source video and the post metadata that came with it.
#[derive(Clone, Debug, PartialEq)]
pub struct AcquiredSource {
    pub video_path: PathBuf,
    pub metadata: TweetMetadata,
}

/// Turns a post reference into a local video plus metadata.
///
/// Implementations write only inside `workdir`.
pub trait SourceProvider {
    fn fetch(&self, reference: &str, workdir: &Path) -> ReelResult<AcquiredSource>;
}

impl<F> SourceProvider for F
where
    F: Fn(&str, &Path) -> ReelResult<AcquiredSource>,
{
    fn fetch(&self, reference: &str, workdir: &Path) -> ReelResult<AcquiredSource> {
        self(reference, workdir)
    }
}

/// Downloads with the `yt-dlp` CLI (best video + best audio, merged).
#[derive(Clone, Debug)]
pub struct YtDlpProvider {
    pub program: PathBuf,
    pub socket_timeout: Duration,
}

impl YtDlpProvider {
    pub fn new(socket_timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            socket_timeout,
        }
    }
}

impl Default for YtDlpProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

const OUTPUT_STEM: &str = "source";

impl SourceProvider for YtDlpProvider {
    #[tracing::instrument(skip(self, workdir))]
    fn fetch(&self, reference: &str, workdir: &Path) -> ReelResult<AcquiredSource> {
        if reference.trim().is_empty() {
            return Err(ReelError::acquisition("empty source reference"));
        }
        let template = workdir.join(format!("{OUTPUT_STEM}.%(ext)s"));

        let out = Command::new(&self.program)
            .stdin(Stdio::null())
            .args([
                "--no-playlist",
                "--no-progress",
                "--no-simulate",
                "--dump-json",
                "-f",
                "bestvideo+bestaudio/best",
                "--merge-output-format",
                "mp4",
                "--socket-timeout",
                &self.socket_timeout.as_secs().max(1).to_string(),
                "-o",
            ])
            .arg(&template)
            .arg("--")
            .arg(reference)
            .output()
            .map_err(|e| {
                ReelError::acquisition(format!(
                    "failed to run {} (is it installed and on PATH?): {e}",
                    self.program.display()
                ))
            })?;

        if !out.status.success() {
            return Err(ReelError::acquisition(format!(
                "yt-dlp exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let metadata = parse_info_json(&out.stdout)?;
        let video_path = find_download(workdir)?;
        tracing::info!(
            video = %video_path.display(),
            user = %metadata.username,
            "source acquired"
        );
        Ok(AcquiredSource {
            video_path,
            metadata,
        })
    }
}

#[derive(serde::Deserialize)]
struct InfoJson {
    uploader: Option<String>,
    uploader_id: Option<String>,
    thumbnail: Option<String>,
    description: Option<String>,
}

/// Map the `yt-dlp` info JSON onto card metadata.
///
/// The uploader's thumbnail doubles as the avatar reference.
pub(crate) fn parse_info_json(stdout: &[u8]) -> ReelResult<TweetMetadata> {
    let line = stdout
        .split(|&b| b == b'\n')
        .rev()
        .find(|l| l.iter().any(|b| !b.is_ascii_whitespace()))
        .ok_or_else(|| ReelError::acquisition("yt-dlp printed no metadata"))?;
    let info: InfoJson = serde_json::from_slice(line)
        .map_err(|e| ReelError::acquisition(format!("yt-dlp metadata parse failed: {e}")))?;

    Ok(TweetMetadata::new(
        info.uploader.unwrap_or_else(|| "User".to_string()),
        info.uploader_id.unwrap_or_else(|| "user".to_string()),
        info.thumbnail,
        info.description.unwrap_or_default(),
    ))
}

fn find_download(workdir: &Path) -> ReelResult<PathBuf> {
    let entries = std::fs::read_dir(workdir).map_err(|e| {
        ReelError::acquisition(format!(
            "failed to list download dir '{}': {e}",
            workdir.display()
        ))
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_finished_download(p))
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ReelError::acquisition("yt-dlp reported success but wrote no video"))
}

fn is_finished_download(path: &Path) -> bool {
    let stem_ok = path.file_stem().and_then(|s| s.to_str()) == Some(OUTPUT_STEM);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    stem_ok && !matches!(ext, "part" | "ytdl" | "json" | "")
}

/// Uses a video that is already on disk with caller-supplied metadata.
#[derive(Clone, Debug)]
pub struct LocalSource {
    pub metadata: TweetMetadata,
}

impl SourceProvider for LocalSource {
    fn fetch(&self, reference: &str, _workdir: &Path) -> ReelResult<AcquiredSource> {
        let video_path = PathBuf::from(reference);
        if !video_path.is_file() {
            return Err(ReelError::acquisition(format!(
                "source video '{}' does not exist",
                video_path.display()
            )));
        }
        Ok(AcquiredSource {
            video_path,
            metadata: self.metadata.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/acquire/source.rs"]
mod tests;
