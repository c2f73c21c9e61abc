//! Archived page encoding
//!
//! Raw pages are stored as gzip-compressed, base64-encoded text so the
//! `RawHTML` table stays a plain TEXT column.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors raised while encoding or decoding an archived page
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),

    #[error("Failed to decode base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to decompress data: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Archived page is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Compresses HTML text and encodes it for storage
pub fn compress(html: &str) -> Result<String, CodecError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(html.len() / 4), Compression::default());
    encoder
        .write_all(html.as_bytes())
        .map_err(CodecError::Compress)?;
    let compressed = encoder.finish().map_err(CodecError::Compress)?;
    Ok(STANDARD.encode(compressed))
}

/// Reverses [`compress`]
pub fn decompress(encoded: &str) -> Result<String, CodecError> {
    let compressed = STANDARD.decode(encoded.trim())?;
    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(CodecError::Decompress)?;
    Ok(String::from_utf8(bytes)?)
}
