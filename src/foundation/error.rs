pub type BoothResult<T> = Result<T, BoothError>;

#[derive(thiserror::Error, Debug)]
pub enum BoothError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("no photo strip in the current session")]
    MissingSession,

    #[error("both strip cells are already filled")]
    OverCapture,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoothError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Only a missing session ends the current page workflow; everything else is a rejected
    /// input and leaves state as it was.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MissingSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            BoothError::permission_denied("x")
                .to_string()
                .contains("permission denied:")
        );
        assert!(BoothError::decode("x").to_string().contains("decode error:"));
        assert!(
            BoothError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(BoothError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = BoothError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn only_missing_session_is_fatal() {
        assert!(!BoothError::MissingSession.is_recoverable());
        assert!(BoothError::OverCapture.is_recoverable());
        assert!(BoothError::decode("frame").is_recoverable());
    }
}
