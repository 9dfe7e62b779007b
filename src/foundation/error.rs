pub type ShotframeResult<T> = Result<T, ShotframeError>;

/// Failure taxonomy for the compositor surface.
///
/// Trim never produces one of these: it recovers locally by returning its
/// input. Render always surfaces them; a broken composite is never silently
/// substituted for a correct one.
#[derive(thiserror::Error, Debug)]
pub enum ShotframeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShotframeError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}
