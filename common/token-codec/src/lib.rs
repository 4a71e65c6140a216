//! HS256 compact token issuance and validation.
//!
//! [`Hs256Codec`] signs a [`Claims`] set into a `header.claims.signature`
//! token and decodes it back, with signature and expiry checks controlled
//! independently through [`DecodeOptions`].

pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod secret;
pub mod token;

pub use claims::Claims;
pub use codec::{DecodeOptions, Hs256Codec, TokenCodec};
pub use config::{CodecConfig, ConfigError};
pub use error::{CodecError, CodecResult};
pub use secret::Secret;
pub use token::{Header, Segments, Token, ALGORITHM_HS256};
