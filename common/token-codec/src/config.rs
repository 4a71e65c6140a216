use std::env;

use thiserror::Error;

pub const DEFAULT_TOKEN_TYPE: &str = "JWT";
/// Room for a 4 KiB header, 16 KiB of claims and an HS256 signature
/// (43 base64url characters), plus separators.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 4 * 1024 + 1 + 16 * 1024 + 1 + 43;

const ENV_LEEWAY: &str = "TOKEN_CODEC_LEEWAY_SECONDS";
const ENV_MAX_TOKEN_BYTES: &str = "TOKEN_CODEC_MAX_TOKEN_BYTES";
const ENV_TOKEN_TYPE: &str = "TOKEN_CODEC_TOKEN_TYPE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Runtime configuration for token encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Value of the `typ` header written on encode.
    pub token_type: String,
    /// Allowable clock skew in seconds when validating exp.
    pub leeway_seconds: u32,
    /// Upper bound on the compact token length, checked on both encode and
    /// decode. This is the only size limit applied.
    pub max_token_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecConfig {
    /// Strict defaults: no leeway, `JWT` token type.
    pub fn new() -> Self {
        Self {
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            leeway_seconds: 0,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }

    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn with_max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len;
        self
    }

    /// Load overrides from `TOKEN_CODEC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(raw) = lookup(ENV_LEEWAY) {
            config.leeway_seconds = parse_number(ENV_LEEWAY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_TOKEN_BYTES) {
            config.max_token_len = parse_number(ENV_MAX_TOKEN_BYTES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TOKEN_TYPE) {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Empty(ENV_TOKEN_TYPE));
            }
            config.token_type = trimmed.to_string();
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_strict() {
        let config = CodecConfig::default();
        assert_eq!(config.leeway_seconds, 0);
        assert_eq!(config.token_type, "JWT");
        assert_eq!(config.max_token_len, DEFAULT_MAX_TOKEN_LEN);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = CodecConfig::from_lookup(lookup_from(&[
            ("TOKEN_CODEC_LEEWAY_SECONDS", "30"),
            ("TOKEN_CODEC_MAX_TOKEN_BYTES", " 2048 "),
            ("TOKEN_CODEC_TOKEN_TYPE", "at+jwt"),
        ]))
        .expect("config loads");
        assert_eq!(config.leeway_seconds, 30);
        assert_eq!(config.max_token_len, 2048);
        assert_eq!(config.token_type, "at+jwt");
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let config = CodecConfig::from_lookup(|_| None).expect("config loads");
        assert_eq!(config, CodecConfig::new());
    }

    #[test]
    fn rejects_invalid_numbers() {
        let err = CodecConfig::from_lookup(lookup_from(&[("TOKEN_CODEC_LEEWAY_SECONDS", "-5")]))
            .expect_err("negative leeway rejected");
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: "TOKEN_CODEC_LEEWAY_SECONDS",
                value: "-5".to_string()
            }
        );
    }

    #[test]
    fn rejects_blank_token_type() {
        let err = CodecConfig::from_lookup(lookup_from(&[("TOKEN_CODEC_TOKEN_TYPE", "  ")]))
            .expect_err("blank type rejected");
        assert_eq!(err, ConfigError::Empty("TOKEN_CODEC_TOKEN_TYPE"));
    }

    #[test]
    fn builder_methods_chain() {
        let config = CodecConfig::new()
            .with_leeway(5)
            .with_token_type("JWS")
            .with_max_token_len(512);
        assert_eq!(config.leeway_seconds, 5);
        assert_eq!(config.token_type, "JWS");
        assert_eq!(config.max_token_len, 512);
    }
}
