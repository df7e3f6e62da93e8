//! Order data preparation: what gets segmented on upload and what
//! segments reassemble into on download.
//!
//! Upload: plain bytes -> zlib -> encrypt. Download reverses it.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use sha2::{Digest, Sha256};

use crate::error::EbicsError;
use crate::session::Session;

/// Compresses (optionally) and encrypts `plain` with the session's encryptor.
pub fn prepare_order_data(
    session: &Session,
    plain: &[u8],
    compress: bool,
) -> Result<Vec<u8>, EbicsError> {
    let caps = session.require_capabilities()?;
    let packed = if compress {
        deflate(plain)?
    } else {
        plain.to_vec()
    };
    Ok(caps.encryptor.encrypt(&packed)?)
}

/// Decrypts downloaded order data and inflates it when `compressed`.
pub fn recover_order_data(
    session: &Session,
    prepared: &[u8],
    compressed: bool,
) -> Result<Vec<u8>, EbicsError> {
    let caps = session.require_capabilities()?;
    let packed = caps.encryptor.decrypt(prepared)?;
    if compressed {
        inflate(&packed)
    } else {
        Ok(packed)
    }
}

/// SHA-256 of prepared order data, the value signed at initialization.
pub fn order_data_digest(prepared: &[u8]) -> [u8; 32] {
    Sha256::digest(prepared).into()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, EbicsError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let compressed = encoder.write_all(data).and_then(|_| encoder.finish());
    compressed.map_err(|e| EbicsError::Encoding(format!("zlib compression failed: {e}")))
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, EbicsError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| EbicsError::Encoding(format!("invalid zlib order data: {e}")))?;
    Ok(out)
}
