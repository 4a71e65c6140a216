use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use zeroize::Zeroizing;

/// Shared secret used to sign and verify tokens. Wiped from memory on drop.
#[derive(Clone)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    pub fn new<B>(bytes: B) -> Self
    where
        B: AsRef<[u8]>,
    {
        Self(Zeroizing::new(bytes.as_ref().to_vec()))
    }

    /// Construct a secret from a base64-encoded string.
    pub fn from_base64(value: &str) -> Result<Self, base64::DecodeError> {
        let decoded = Zeroizing::new(BASE64_STANDARD.decode(value.trim())?);
        Ok(Self::new(decoded.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for Secret {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("bytes", &"***redacted***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let secret = Secret::from("secret-key");
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn base64_secret_parsing() {
        let encoded = BASE64_STANDARD.encode(b"secret-key");
        let parsed = Secret::from_base64(&format!(" {encoded}\n")).expect("parse");
        assert_eq!(parsed.expose(), b"secret-key");
        assert!(Secret::from_base64("not base64!").is_err());
    }

    #[test]
    fn empty_secret_is_detected() {
        assert!(Secret::new(b"").is_empty());
        assert!(!Secret::from("k").is_empty());
    }
}
