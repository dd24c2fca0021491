use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};

/// Resolves an avatar reference to raw image bytes.
///
/// Failures are reported as `AvatarUnavailable`; callers substitute a placeholder.
pub trait AvatarFetcher {
    fn fetch_bytes(&self, avatar_ref: &str) -> ReelResult<Vec<u8>>;
}

impl<F> AvatarFetcher for F
where
    F: Fn(&str) -> ReelResult<Vec<u8>>,
{
    fn fetch_bytes(&self, avatar_ref: &str) -> ReelResult<Vec<u8>> {
        self(avatar_ref)
    }
}

/// Largest avatar body accepted from the network.
pub const MAX_AVATAR_BYTES: u64 = 10 * 1024 * 1024;

/// Whether `avatar_ref` names a network resource rather than a local file.
pub fn is_remote_ref(avatar_ref: &str) -> bool {
    let avatar_ref = avatar_ref.trim();
    avatar_ref.starts_with("http://") || avatar_ref.starts_with("https://")
}

/// Fetches `http(s)://` references over the network and reads anything else from disk.
pub struct HttpAvatarFetcher {
    client: reqwest::blocking::Client,
    max_bytes: u64,
}

impl HttpAvatarFetcher {
    pub fn new(timeout: Duration) -> ReelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ReelError::validation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: MAX_AVATAR_BYTES,
        })
    }

    /// Cap on downloaded body size; larger avatars are reported unavailable.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl AvatarFetcher for HttpAvatarFetcher {
    #[tracing::instrument(skip(self))]
    fn fetch_bytes(&self, avatar_ref: &str) -> ReelResult<Vec<u8>> {
        let avatar_ref = avatar_ref.trim();
        if is_remote_ref(avatar_ref) {
            let response = self
                .client
                .get(avatar_ref)
                .send()
                .map_err(|e| ReelError::avatar_unavailable(format!("request failed: {e}")))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ReelError::avatar_unavailable(format!("HTTP {status}")));
            }
            if let Some(len) = response.content_length()
                && len > self.max_bytes
            {
                return Err(ReelError::avatar_unavailable(format!(
                    "avatar is {len} bytes, limit is {}",
                    self.max_bytes
                )));
            }
            let bytes = read_capped(response, self.max_bytes)?;
            tracing::debug!(bytes = bytes.len(), "avatar downloaded");
            return Ok(bytes);
        }

        let path = avatar_ref.strip_prefix("file://").unwrap_or(avatar_ref);
        read_local(Path::new(path))
    }
}

/// Read at most `max_bytes`; a longer body is an error rather than a silent truncation.
fn read_capped(body: impl Read, max_bytes: u64) -> ReelResult<Vec<u8>> {
    let mut bytes = Vec::new();
    body.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| ReelError::avatar_unavailable(format!("body read failed: {e}")))?;
    if bytes.len() as u64 > max_bytes {
        return Err(ReelError::avatar_unavailable(format!(
            "avatar exceeds the {max_bytes} byte limit"
        )));
    }
    Ok(bytes)
}

fn read_local(path: &Path) -> ReelResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        ReelError::avatar_unavailable(format!("cannot read '{}': {e}", path.display()))
    })
}
