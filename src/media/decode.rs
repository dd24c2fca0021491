use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::probe::VideoAsset;
use crate::raster::buffer::{RasterImage, premultiply_rgba8_in_place};

/// Streams decoded frames of a [`VideoAsset`] from an `ffmpeg` child process.
///
/// Frames come out in presentation order as premultiplied RGBA8 with the asset's post-filter
/// geometry. Only one frame is buffered at a time.
pub struct FrameReader {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    width: u32,
    height: u32,
    next: FrameIndex,
    finished: bool,
}

impl FrameReader {
    #[tracing::instrument(skip(video), fields(src = %video.source_path.display()))]
    pub fn open(video: &VideoAsset) -> ReelResult<Self> {
        if video.width == 0 || video.height == 0 {
            return Err(ReelError::geometry(video.width, video.height));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(&video.source_path)
            .args(["-map", "0:v:0"]);
        if let Some(graph) = video.filter_graph() {
            tracing::debug!(%graph, "decode filter chain");
            cmd.args(["-vf", &graph]);
        }
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"]);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn ffmpeg for decode (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            width: video.width,
            height: video.height,
            next: FrameIndex(0),
            finished: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read the next frame; `Ok(None)` at end of stream.
    ///
    /// A trailing partial frame or a non-zero decoder exit is an `Encode` error.
    pub fn next_frame(&mut self) -> ReelResult<Option<(FrameIndex, RasterImage)>> {
        if self.finished {
            return Ok(None);
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let len = self.width as usize * self.height as usize * 4;
        let mut buf = vec![0u8; len];
        let filled = read_full(stdout, &mut buf)
            .map_err(|e| ReelError::encode(format!("failed to read decoded frame: {e}")))?;

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < len {
            self.finish()?;
            return Err(ReelError::encode(format!(
                "decoder produced a partial frame ({filled} of {len} bytes)"
            )));
        }

        premultiply_rgba8_in_place(&mut buf);
        let idx = self.next;
        self.next = FrameIndex(idx.0 + 1);
        let frame = RasterImage::from_premul(self.width, self.height, buf)?;
        Ok(Some((idx, frame)))
    }

    /// Read up to `max` frames.
    pub fn next_chunk(&mut self, max: usize) -> ReelResult<Vec<(FrameIndex, RasterImage)>> {
        let mut out = Vec::with_capacity(max);
        while out.len() < max {
            match self.next_frame()? {
                Some(frame) => out.push(frame),
                None => break,
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> ReelResult<()> {
        self.finished = true;
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg decode: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(ReelError::encode(format!(
                "ffmpeg decode exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        tracing::debug!(frames = self.next.0, "decode finished");
        Ok(())
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Fill `buf` from `r` until full or EOF. Returns the number of bytes read.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
