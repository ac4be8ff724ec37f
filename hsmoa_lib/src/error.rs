//! Error types for the library layer.

use std::fmt;

use crate::source::FetchDecodeError;

/// Errors that abort a collection run.
#[derive(Debug)]
pub enum CollectError {
    /// The browser session could not be started.
    Session(String),
    /// The cipher library could not be loaded into the page.
    CipherLoad(String),
    /// The protected endpoint call or the in-page decrypt failed.
    Fetch(FetchDecodeError),
    /// The decrypted payload could not be decompressed or parsed.
    Decode(hsmoa_api::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(msg) => write!(f, "Session error: {}", msg),
            Self::CipherLoad(msg) => write!(f, "Cipher load error: {}", msg),
            Self::Fetch(e) => write!(f, "API error: {}", e),
            Self::Decode(e) => write!(f, "Decode error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchDecodeError> for CollectError {
    fn from(e: FetchDecodeError) -> Self {
        Self::Fetch(e)
    }
}

impl From<hsmoa_api::Error> for CollectError {
    fn from(e: hsmoa_api::Error) -> Self {
        Self::Decode(e)
    }
}
