use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;

use crate::claims::Claims;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::secret::Secret;
use crate::token::{encode_segment, Header, Segments, Token, ALGORITHM_HS256};

type HmacSha256 = Hmac<Sha256>;

/// Which checks `decode` performs. Signature and expiry are independent so a
/// caller can read the claims of a token whose signature is checked elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub verify_signature: bool,
    pub verify_expiry: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl DecodeOptions {
    pub fn new(verify_signature: bool, verify_expiry: bool) -> Self {
        Self {
            verify_signature,
            verify_expiry,
        }
    }

    /// Neither signature nor expiry is checked.
    pub fn insecure() -> Self {
        Self::new(false, false)
    }

    pub fn with_signature(mut self, verify: bool) -> Self {
        self.verify_signature = verify;
        self
    }

    pub fn with_expiry(mut self, verify: bool) -> Self {
        self.verify_expiry = verify;
        self
    }
}

/// Signs claims into compact tokens and reads them back.
pub trait TokenCodec {
    fn encode(&self, claims: &Claims, secret: &Secret) -> CodecResult<Token>;

    /// Decode against an explicit current time.
    fn decode_at(
        &self,
        token: &str,
        secret: Option<&Secret>,
        options: DecodeOptions,
        now: DateTime<Utc>,
    ) -> CodecResult<Claims>;

    fn decode(
        &self,
        token: &str,
        secret: Option<&Secret>,
        options: DecodeOptions,
    ) -> CodecResult<Claims> {
        self.decode_at(token, secret, options, Utc::now())
    }

    /// Full verification: signature and expiry.
    fn validate(&self, token: &str, secret: &Secret) -> CodecResult<Claims> {
        self.decode(token, Some(secret), DecodeOptions::default())
    }

    /// Read claims without any verification.
    fn inspect(&self, token: &str) -> CodecResult<Claims> {
        self.decode(token, None, DecodeOptions::insecure())
    }
}

/// HMAC-SHA256 (`HS256`) token codec.
#[derive(Debug, Clone, Default)]
pub struct Hs256Codec {
    config: CodecConfig,
}

impl Hs256Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl TokenCodec for Hs256Codec {
    fn encode(&self, claims: &Claims, secret: &Secret) -> CodecResult<Token> {
        if secret.is_empty() {
            return Err(CodecError::EmptySecret);
        }
        claims
            .require_expiry()
            .map_err(|err| CodecError::Encoding(err.to_string()))?;

        let header = serde_json::to_vec(&Header::hs256(&self.config.token_type))?;
        let payload = serde_json::to_vec(claims)?;

        let header_b64 = encode_segment(&header);
        let payload_b64 = encode_segment(&payload);

        let mut token = format!("{header_b64}.{payload_b64}");
        let signature = sign(secret, token.as_bytes())?;
        token.push('.');
        token.push_str(&encode_segment(&signature));

        if token.len() > self.config.max_token_len {
            return Err(CodecError::Encoding(format!(
                "token length {} exceeds configured maximum {}",
                token.len(),
                self.config.max_token_len
            )));
        }

        debug!(len = token.len(), "encoded token");
        Ok(Token::from(token))
    }

    fn decode_at(
        &self,
        token: &str,
        secret: Option<&Secret>,
        options: DecodeOptions,
        now: DateTime<Utc>,
    ) -> CodecResult<Claims> {
        // Cap before scanning attacker-controlled input for separators.
        if token.len() > self.config.max_token_len {
            return Err(CodecError::MalformedToken(format!(
                "token exceeds {} bytes",
                self.config.max_token_len
            )));
        }

        let segments = Segments::parse(token)?;
        let header_raw = segments.decode_header()?;
        let claims_raw = segments.decode_claims()?;
        let provided = segments.decode_signature()?;

        if options.verify_signature {
            let secret = secret
                .filter(|secret| !secret.is_empty())
                .ok_or(CodecError::EmptySecret)?;
            let mut mac = keyed_mac(secret)?;
            mac.update(&segments.signing_input());
            // verify_slice compares in constant time.
            if mac.verify_slice(&provided).is_err() {
                debug!("rejected token: signature mismatch");
                return Err(CodecError::InvalidSignature);
            }
        }

        let header: Header = serde_json::from_slice(&header_raw)
            .map_err(|err| CodecError::MalformedToken(format!("header segment: {err}")))?;
        if options.verify_signature && header.alg != ALGORITHM_HS256 {
            debug!(alg = %header.alg, "rejected token: unsupported algorithm");
            return Err(CodecError::UnsupportedAlgorithm(header.alg));
        }

        let payload: Value = serde_json::from_slice(&claims_raw)
            .map_err(|err| CodecError::MalformedToken(format!("claims segment: {err}")))?;
        let claims = Claims::try_from(payload)?;

        if options.verify_expiry && claims.is_expired_at(now, self.config.leeway_seconds)? {
            debug!(exp = ?claims.expiry(), "rejected token: expired");
            return Err(CodecError::ExpiredToken);
        }

        debug!(
            verified_signature = options.verify_signature,
            verified_expiry = options.verify_expiry,
            "decoded token"
        );
        Ok(claims)
    }
}

fn keyed_mac(secret: &Secret) -> CodecResult<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(secret.expose())
        .map_err(|err| CodecError::Encoding(format!("invalid HMAC key: {err}")))
}

fn sign(secret: &Secret, input: &[u8]) -> CodecResult<Vec<u8>> {
    let mut mac = keyed_mac(secret)?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}
