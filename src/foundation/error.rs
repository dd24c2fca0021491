/// Crate-wide result alias.
pub type ReelResult<T> = Result<T, ReelError>;

/// Coarse error category, stable for callers that branch on failure type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or zero-size image input.
    InvalidImage,
    /// Avatar could not be fetched or decoded (recoverable).
    AvatarUnavailable,
    /// Zero or invalid video dimensions.
    UnsupportedGeometry,
    /// Source acquisition failed.
    Acquisition,
    /// Decode, mux, or encode failed.
    Encode,
    /// Invalid configuration or arguments.
    Validation,
    /// The run was cancelled by its caller.
    Cancelled,
    /// Anything else (IO with context, etc).
    Other,
}

/// Errors produced by card rendering, media processing and the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("avatar unavailable: {0}")]
    AvatarUnavailable(String),

    #[error("unsupported geometry: {width}x{height}")]
    UnsupportedGeometry { width: u32, height: u32 },

    #[error("acquisition failed: {0}")]
    Acquisition(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<ReelError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn avatar_unavailable(msg: impl Into<String>) -> Self {
        Self::AvatarUnavailable(msg.into())
    }

    pub fn geometry(width: u32, height: u32) -> Self {
        Self::UnsupportedGeometry { width, height }
    }

    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Tag an error with the pipeline stage it came from. Already-tagged errors keep their
    /// innermost stage.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            Self::Stage { .. } | Self::Cancelled => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Pipeline stage recorded by [`ReelError::in_stage`], if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidImage(_) => ErrorKind::InvalidImage,
            Self::AvatarUnavailable(_) => ErrorKind::AvatarUnavailable,
            Self::UnsupportedGeometry { .. } => ErrorKind::UnsupportedGeometry,
            Self::Acquisition(_) => ErrorKind::Acquisition,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Stage { source, .. } => source.kind(),
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Recoverable conditions are handled locally and never abort a run.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::AvatarUnavailable
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
