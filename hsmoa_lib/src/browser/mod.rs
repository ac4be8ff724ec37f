//! Headless Chromium source.
//!
//! The site only serves the schedule API to a session established by a real
//! page load, so this source drives Chromium over CDP: it opens the landing
//! page with a browser identity, injects CryptoJS, and performs the fetch and
//! decrypt inside the page.

mod scripts;
mod session;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hsmoa_api::user_agent::get_user_agent;
use hsmoa_api::DEFAULT_BASE_URL;
use url::Url;

pub use scripts::PageOutcome;
pub use session::BrowserSession;

use crate::delay::SettleDelay;
use crate::error::CollectError;
use crate::source::{FetchDecodeError, ScheduleSource};

/// CDN copy of the cipher library the site's own client uses.
pub const CIPHER_SCRIPT_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/crypto-js/4.2.0/crypto-js.min.js";

/// Browser automation failures.
#[derive(thiserror::Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Cipher library unavailable: {0}")]
    CipherLoad(String),
    #[error("Script evaluation failed: {0}")]
    Evaluate(String),
}

/// Launch and identity settings for [`BrowserSession`].
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub base_url: String,
    pub user_agent: String,
    pub locale: String,
    pub viewport: (u32, u32),
    pub headless: bool,
    pub nav_timeout: Duration,
    /// Bound on one in-page evaluation, including the protected fetch.
    pub eval_timeout: Duration,
    pub cipher_script_url: String,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: get_user_agent().to_string(),
            locale: "ko-KR".to_string(),
            viewport: (1920, 1080),
            headless: true,
            nav_timeout: Duration::from_secs(30),
            eval_timeout: Duration::from_secs(120),
            cipher_script_url: CIPHER_SCRIPT_URL.to_string(),
            chrome_executable: None,
        }
    }
}

impl BrowserOptions {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_executable(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_executable = path;
        self
    }

    /// Per-command CDP timeout. Must cover the slowest evaluation; navigation
    /// is bounded separately by `nav_timeout`.
    pub fn request_timeout(&self) -> Duration {
        self.nav_timeout.max(self.eval_timeout)
    }

    /// `Accept-Language` header value for the locale, e.g. `ko-KR,ko;q=0.9`.
    pub fn accept_language(&self) -> String {
        match self.locale.split_once('-') {
            Some((lang, _)) => format!("{},{};q=0.9", self.locale, lang),
            None => self.locale.clone(),
        }
    }
}

/// [`ScheduleSource`] backed by a Chromium session.
pub struct BrowserSource {
    options: BrowserOptions,
    delay: SettleDelay,
    session: Option<BrowserSession>,
}

impl BrowserSource {
    pub fn new(options: BrowserOptions) -> Self {
        Self::with_delay(options, SettleDelay::new())
    }

    pub fn with_delay(options: BrowserOptions, delay: SettleDelay) -> Self {
        Self {
            options,
            delay,
            session: None,
        }
    }

    fn session(&self) -> Result<&BrowserSession, BrowserError> {
        self.session
            .as_ref()
            .ok_or_else(|| BrowserError::Launch("session not bootstrapped".into()))
    }
}

#[async_trait]
impl ScheduleSource for BrowserSource {
    async fn bootstrap(&mut self) -> Result<(), CollectError> {
        tracing::info!(
            "Launching browser (UA: {}...)",
            self.options.user_agent.chars().take(50).collect::<String>()
        );
        let session = BrowserSession::launch(&self.options)
            .await
            .map_err(|e| CollectError::Session(e.to_string()))?;

        let landing = format!("{}/", self.options.base_url);
        match session.navigate(&landing).await {
            Ok(()) => tracing::info!("Loaded {}", landing),
            Err(e) => tracing::warn!("Landing page did not settle, continuing: {}", e),
        }
        self.session = Some(session);
        self.delay.wait().await;
        Ok(())
    }

    async fn load_cipher(&mut self) -> Result<(), CollectError> {
        let script_url = self.options.cipher_script_url.clone();
        let session = self
            .session()
            .map_err(|e| CollectError::CipherLoad(e.to_string()))?;
        session
            .load_cipher(&script_url)
            .await
            .map_err(|e| CollectError::CipherLoad(e.to_string()))?;
        tracing::info!("CryptoJS loaded");
        Ok(())
    }

    async fn fetch_and_decode(&mut self, url: &Url, key: &str) -> Result<String, FetchDecodeError> {
        tracing::info!("Calling schedule API: {}", url);
        let session = self
            .session()
            .map_err(|e| FetchDecodeError::Other(e.to_string()))?;
        session.fetch_and_decode(url, key).await
    }

    async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
            tracing::debug!("Browser closed");
        }
    }
}
