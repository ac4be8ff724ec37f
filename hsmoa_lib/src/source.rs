//! Schedule source capability and its plain-HTTP implementation.
//!
//! A source owns everything up to the decrypted text: session setup, cipher
//! availability, the protected request, and decryption. The pipeline drives
//! it through [`ScheduleSource`] and never sees transport details.

use async_trait::async_trait;
use hsmoa_api::cipher::decrypt_envelope;
use hsmoa_api::Client;
use url::Url;

use crate::delay::SettleDelay;
use crate::error::CollectError;

/// Why an envelope could not be fetched and decrypted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchDecodeError {
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("missing results/iv")]
    MissingFields,
    #[error("decrypt produced empty output")]
    DecryptEmpty,
    #[error("{0}")]
    Other(String),
}

impl From<hsmoa_api::Error> for FetchDecodeError {
    fn from(e: hsmoa_api::Error) -> Self {
        match e {
            hsmoa_api::Error::HttpStatus { status, .. } => Self::HttpStatus(status),
            hsmoa_api::Error::MissingFields => Self::MissingFields,
            hsmoa_api::Error::DecryptEmpty => Self::DecryptEmpty,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Session-bound access to the protected schedule endpoint.
#[async_trait]
pub trait ScheduleSource: Send {
    /// Establishes the session against the site origin. Navigation problems
    /// are logged and tolerated; only an unusable session is an error.
    async fn bootstrap(&mut self) -> Result<(), CollectError>;

    /// Makes the cipher available to [`ScheduleSource::fetch_and_decode`].
    async fn load_cipher(&mut self) -> Result<(), CollectError> {
        Ok(())
    }

    /// Calls `url` within the session and returns the decrypted text.
    async fn fetch_and_decode(&mut self, url: &Url, key: &str) -> Result<String, FetchDecodeError>;

    /// Releases session resources. Safe to call more than once.
    async fn shutdown(&mut self) {}
}

/// Source that talks to the site with a cookie-holding HTTP client and
/// decrypts natively.
pub struct HttpSource {
    client: Client,
    delay: SettleDelay,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self::with_delay(client, SettleDelay::new())
    }

    pub fn with_delay(client: Client, delay: SettleDelay) -> Self {
        Self { client, delay }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ScheduleSource for HttpSource {
    async fn bootstrap(&mut self) -> Result<(), CollectError> {
        let ua = self.client.user_agent();
        tracing::info!("Bootstrapping session (UA: {}...)", ua.chars().take(50).collect::<String>());
        if let Err(e) = self.client.bootstrap().await {
            tracing::warn!("Landing page did not load cleanly: {}", e);
        }
        self.delay.wait().await;
        Ok(())
    }

    async fn fetch_and_decode(&mut self, url: &Url, key: &str) -> Result<String, FetchDecodeError> {
        tracing::info!("Calling schedule API: {}", url);
        let envelope = self.client.get_envelope(url).await?;
        Ok(decrypt_envelope(&envelope, key)?)
    }
}
