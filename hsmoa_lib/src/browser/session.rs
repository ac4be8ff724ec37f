use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetLocaleOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use url::Url;

use super::scripts::{self, PageOutcome};
use super::{BrowserError, BrowserOptions};
use crate::source::FetchDecodeError;

/// Pause between script injection and the `CryptoJS` presence check.
const CIPHER_SETTLE: Duration = Duration::from_secs(1);

/// One Chromium process with a single configured page.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    nav_timeout: Duration,
    eval_timeout: Duration,
}

impl BrowserSession {
    /// Launches Chromium and opens a blank page carrying the session identity
    /// (user agent, `Accept-Language`, locale, viewport).
    pub async fn launch(options: &BrowserOptions) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg(format!("--lang={}", options.locale))
            .window_size(options.viewport.0, options.viewport.1)
            .viewport(Viewport {
                width: options.viewport.0,
                height: options.viewport.1,
                ..Viewport::default()
            })
            .request_timeout(options.request_timeout());
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        let session = Self {
            browser,
            page,
            handler,
            nav_timeout: options.nav_timeout,
            eval_timeout: options.eval_timeout,
        };
        session.apply_identity(options).await?;
        Ok(session)
    }

    async fn apply_identity(&self, options: &BrowserOptions) -> Result<(), BrowserError> {
        let ua = SetUserAgentOverrideParams::builder()
            .user_agent(options.user_agent.clone())
            .accept_language(options.accept_language())
            .build()
            .map_err(BrowserError::Launch)?;
        self.page
            .execute(ua)
            .await
            .map_err(|e| BrowserError::Launch(format!("user agent override: {}", e)))?;

        let locale = SetLocaleOverrideParams {
            locale: Some(options.locale.clone()),
        };
        if let Err(e) = self.page.execute(locale).await {
            tracing::warn!("Locale override rejected: {}", e);
        }
        Ok(())
    }

    /// Navigates to `url`, waiting at most the navigation timeout.
    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        match tokio::time::timeout(self.nav_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation(e.to_string())),
            Err(_) => Err(BrowserError::Navigation(format!(
                "timed out after {}s",
                self.nav_timeout.as_secs()
            ))),
        }
    }

    /// Injects the cipher library and checks that `CryptoJS` is defined.
    pub async fn load_cipher(&self, script_url: &str) -> Result<(), BrowserError> {
        let loaded: bool = self
            .evaluate(scripts::inject_cipher(script_url))
            .await
            .map_err(|e| BrowserError::CipherLoad(e.to_string()))?;
        if !loaded {
            tracing::warn!("Cipher script reported a load error: {}", script_url);
        }
        tokio::time::sleep(CIPHER_SETTLE).await;

        let present: bool = self
            .evaluate(scripts::CIPHER_PRESENT.to_string())
            .await
            .map_err(|e| BrowserError::CipherLoad(e.to_string()))?;
        if !present {
            return Err(BrowserError::CipherLoad(format!(
                "CryptoJS is not defined after loading {}",
                script_url
            )));
        }
        Ok(())
    }

    /// Runs the protected request and the decrypt inside the page.
    pub async fn fetch_and_decode(&self, url: &Url, key: &str) -> Result<String, FetchDecodeError> {
        let outcome: PageOutcome = self
            .evaluate(scripts::fetch_and_decrypt(url, key))
            .await
            .map_err(|e| FetchDecodeError::Other(e.to_string()))?;
        outcome.interpret()
    }

    async fn evaluate<T: DeserializeOwned>(&self, expression: String) -> Result<T, BrowserError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Evaluate)?;
        let result =
            match tokio::time::timeout(self.eval_timeout, self.page.evaluate_expression(params))
                .await
            {
                Ok(result) => result.map_err(|e| BrowserError::Evaluate(e.to_string()))?,
                Err(_) => {
                    return Err(BrowserError::Evaluate(format!(
                        "timed out after {}s",
                        self.eval_timeout.as_secs()
                    )))
                }
            };
        result
            .into_value()
            .map_err(|e| BrowserError::Evaluate(format!("unexpected result: {}", e)))
    }

    /// Closes the browser and stops the CDP handler.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser wait failed: {}", e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
