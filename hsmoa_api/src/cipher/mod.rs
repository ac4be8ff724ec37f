//! Envelope decoding: AES-CBC decryption and zlib decompression.
//!
//! The endpoint returns `{results, iv}`. `results` is base64 ciphertext
//! encrypted under a fixed UTF-8 key with the per-response `iv`. The
//! plaintext is itself base64 text of a zlib stream that inflates to the
//! JSON schedule document.

pub mod block;

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use self::block::{cbc_decrypt, cbc_encrypt, Block, Rijndael, BLOCK_SIZE};
use crate::types::Envelope;
use crate::Error;

/// Fixed key the site's client uses for schedule payloads.
pub const SCHEDULE_KEY: &str = "0b659773-ee62-41f6-9162-5f4217488e2c";

/// Decrypts an envelope to its UTF-8 plaintext.
///
/// An empty plaintext is [`Error::DecryptEmpty`], never an empty success.
pub fn decrypt_envelope(envelope: &Envelope, key: &str) -> Result<String, Error> {
    let iv = parse_iv(&envelope.iv)?;
    let ciphertext = STANDARD
        .decode(envelope.results.trim())
        .map_err(|e| Error::Decrypt(format!("ciphertext is not base64: {}", e)))?;
    let cipher = Rijndael::new(key.as_bytes())?;
    let plaintext = cbc_decrypt(&cipher, &iv, &ciphertext)?;
    let text = String::from_utf8(plaintext)
        .map_err(|_| Error::Decrypt("plaintext is not valid UTF-8".into()))?;
    if text.is_empty() {
        return Err(Error::DecryptEmpty);
    }
    Ok(text)
}

/// Encrypts `plaintext` into an envelope the way the upstream does.
pub fn seal_envelope(plaintext: &str, key: &str, iv: &Block) -> Result<Envelope, Error> {
    let cipher = Rijndael::new(key.as_bytes())?;
    let ciphertext = cbc_encrypt(&cipher, iv, plaintext.as_bytes());
    Ok(Envelope {
        results: STANDARD.encode(ciphertext),
        iv: hex::encode(iv),
    })
}

fn parse_iv(raw: &str) -> Result<Block, Error> {
    let bytes =
        hex::decode(raw.trim()).map_err(|e| Error::Decrypt(format!("iv is not hex: {}", e)))?;
    <Block>::try_from(bytes.as_slice()).map_err(|_| {
        Error::Decrypt(format!(
            "iv must be {} bytes, got {}",
            BLOCK_SIZE,
            bytes.len()
        ))
    })
}

/// Recovers the JSON text from decrypted base64 of a zlib stream.
pub fn inflate_payload(plaintext_b64: &str) -> Result<String, Error> {
    let compressed = STANDARD
        .decode(plaintext_b64.trim())
        .map_err(|e| Error::Decompress(format!("payload is not base64: {}", e)))?;

    let mut inflated = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut inflated)
        .map_err(|e| Error::Decompress(e.to_string()))?;
    String::from_utf8(inflated)
        .map_err(|_| Error::Decompress("inflated payload is not valid UTF-8".into()))
}

/// Compresses `json` with zlib and base64-encodes the stream.
pub fn deflate_payload(json: &str) -> Result<String, Error> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| Error::Decompress(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::Decompress(e.to_string()))?;
    Ok(STANDARD.encode(compressed))
}

/// Inflates and parses the decrypted payload into a JSON value.
pub fn decode_document(plaintext_b64: &str) -> Result<serde_json::Value, Error> {
    let json = inflate_payload(plaintext_b64)?;
    tracing::debug!("Inflated schedule payload: {} chars", json.chars().count());
    serde_json::from_str(&json).map_err(|e| Error::Parse(e.to_string()))
}
