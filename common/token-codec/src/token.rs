use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

pub const ALGORITHM_HS256: &str = "HS256";

/// JOSE header written into every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub fn hs256(token_type: impl Into<String>) -> Self {
        Self {
            alg: ALGORITHM_HS256.to_string(),
            typ: Some(token_type.into()),
        }
    }
}

/// Compact serialized token: `header.claims.signature`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into validated segments without verifying anything cryptographic.
    pub fn segments(&self) -> CodecResult<Segments<'_>> {
        Segments::parse(&self.0)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three base64url segments of a compact token, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    pub header: &'a str,
    pub claims: &'a str,
    pub signature: &'a str,
}

impl<'a> Segments<'a> {
    pub fn parse(raw: &'a str) -> CodecResult<Self> {
        let mut parts = raw.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            let separators = raw.matches('.').count();
            return Err(CodecError::MalformedToken(format!(
                "expected 3 segments, found {}",
                separators + 1
            )));
        };

        check_segment("header", header)?;
        check_segment("claims", claims)?;
        check_segment("signature", signature)?;

        Ok(Self {
            header,
            claims,
            signature,
        })
    }

    /// The bytes covered by the signature: `header.claims`.
    pub fn signing_input(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.header.len() + 1 + self.claims.len());
        input.extend_from_slice(self.header.as_bytes());
        input.push(b'.');
        input.extend_from_slice(self.claims.as_bytes());
        input
    }

    pub fn decode_header(&self) -> CodecResult<Vec<u8>> {
        decode_segment("header", self.header)
    }

    pub fn decode_claims(&self) -> CodecResult<Vec<u8>> {
        decode_segment("claims", self.claims)
    }

    pub fn decode_signature(&self) -> CodecResult<Vec<u8>> {
        decode_segment("signature", self.signature)
    }
}

pub(crate) fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn check_segment(name: &'static str, raw: &str) -> CodecResult<()> {
    if raw.is_empty() {
        return Err(CodecError::MalformedToken(format!("{name} segment is empty")));
    }
    // Length mod 4 == 1 can never be produced by unpadded base64.
    let alphabet_ok = raw
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !alphabet_ok || raw.len() % 4 == 1 {
        return Err(CodecError::MalformedToken(format!(
            "{name} segment is not base64url"
        )));
    }
    Ok(())
}

fn decode_segment(name: &'static str, raw: &str) -> CodecResult<Vec<u8>> {
    // The default engine config rejects padding and non-zero trailing bits,
    // so only canonical encodings decode.
    URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|err| CodecError::MalformedToken(format!("{name} segment: {err}")))
}
