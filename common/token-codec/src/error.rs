use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("failed to encode claims: {0}")]
    Encoding(String),
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    ExpiredToken,
    #[error("unsupported token algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("invalid claim '{0}': {1}")]
    InvalidClaim(&'static str, String),
    #[error("a non-empty secret is required")]
    EmptySecret,
}

impl CodecError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::Encoding(_) => "TOKEN_ENCODING",
            CodecError::MalformedToken(_) => "TOKEN_MALFORMED",
            CodecError::InvalidSignature => "TOKEN_SIGNATURE",
            CodecError::ExpiredToken => "TOKEN_EXPIRED",
            CodecError::UnsupportedAlgorithm(_) => "TOKEN_ALGORITHM",
            CodecError::InvalidClaim(_, _) => "TOKEN_CLAIMS",
            CodecError::EmptySecret => "TOKEN_SECRET",
        }
    }

    /// Message suitable for end users. Expiry is reported on its own; every
    /// other rejection collapses to a generic invalid-token message.
    pub fn user_message(&self) -> &'static str {
        match self {
            CodecError::ExpiredToken => "Token has expired!",
            CodecError::Encoding(_) => "Token could not be issued!",
            _ => "Invalid token!",
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, CodecError::ExpiredToken)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value.to_string())
    }
}
