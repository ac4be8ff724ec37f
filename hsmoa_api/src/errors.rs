//! Error types for the API client and the envelope decoder.

/// Errors that can occur when requesting or decoding a schedule payload.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unexpected response).
    #[error("Request failed")]
    RequestFailed,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response parsed but `results` or `iv` was absent or empty.
    #[error("Response is missing the results/iv fields")]
    MissingFields,
    /// The ciphertext, IV, key, or padding could not be decrypted.
    #[error("Decryption failed: {0}")]
    Decrypt(String),
    /// Decryption succeeded but produced no text.
    #[error("Decryption produced an empty plaintext")]
    DecryptEmpty,
    /// The decrypted text was not a base64 zlib stream of UTF-8 data.
    #[error("Decompression failed: {0}")]
    Decompress(String),
    /// A response or decoded document was not the expected JSON.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}
