//! End-to-end collection run.

use chrono::{Local, NaiveDate};
use hsmoa_api::cipher::{decode_document, SCHEDULE_KEY};
use hsmoa_api::types::ScheduleDocument;
use hsmoa_api::{ScheduleQuery, DEFAULT_BASE_URL};
use serde_json::Value;

use crate::error::CollectError;
use crate::report::ScheduleReport;
use crate::schedule::extract_schedule_items;
use crate::source::ScheduleSource;

/// Parameters of one run.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub target_date: NaiveDate,
    pub base_url: String,
    pub key: String,
}

impl CollectConfig {
    pub fn new(target_date: NaiveDate) -> Self {
        Self {
            target_date,
            base_url: DEFAULT_BASE_URL.to_string(),
            key: SCHEDULE_KEY.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// What a run produced.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// At least one item survived normalization and filtering.
    Collected(ScheduleReport),
    /// The document decoded but held no items. `raw` is the decoded document
    /// for diagnosis.
    NoData { date: NaiveDate, raw: Value },
}

/// Runs bootstrap, cipher load, fetch, decode and extraction against
/// `source`. The source is shut down before decoding starts, whatever the
/// outcome of the fetch.
pub async fn collect<S: ScheduleSource + ?Sized>(
    source: &mut S,
    config: &CollectConfig,
) -> Result<PipelineOutcome, CollectError> {
    let fetched = acquire(source, config).await;
    source.shutdown().await;
    let plaintext = fetched?;

    let raw = decode_document(&plaintext)?;
    let doc = ScheduleDocument::from_value(&raw)?;
    tracing::info!("Decoded document with {} raw items", doc.item_count());

    let items = extract_schedule_items(&doc, config.target_date);
    if items.is_empty() {
        tracing::warn!("No schedule items for {}", config.target_date);
        return Ok(PipelineOutcome::NoData {
            date: config.target_date,
            raw,
        });
    }

    tracing::info!("Collected {} items", items.len());
    Ok(PipelineOutcome::Collected(ScheduleReport::new(
        config.target_date,
        items,
        Local::now().naive_local(),
    )))
}

async fn acquire<S: ScheduleSource + ?Sized>(
    source: &mut S,
    config: &CollectConfig,
) -> Result<String, CollectError> {
    let url = ScheduleQuery::for_date(config.target_date)
        .to_url(&config.base_url)
        .map_err(|e| {
            CollectError::InvalidInput(format!("base URL '{}': {}", config.base_url, e))
        })?;
    source.bootstrap().await?;
    source.load_cipher().await?;
    let plaintext = source.fetch_and_decode(&url, &config.key).await?;
    tracing::debug!("Decrypted {} characters", plaintext.len());
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchDecodeError;
    use async_trait::async_trait;
    use hsmoa_api::cipher::deflate_payload;
    use serde_json::json;
    use url::Url;

    /// Source returning a canned result and recording the call sequence.
    struct StubSource {
        result: Result<String, FetchDecodeError>,
        fail_cipher: bool,
        calls: Vec<String>,
    }

    impl StubSource {
        fn returning(result: Result<String, FetchDecodeError>) -> Self {
            Self {
                result,
                fail_cipher: false,
                calls: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ScheduleSource for StubSource {
        async fn bootstrap(&mut self) -> Result<(), CollectError> {
            self.calls.push("bootstrap".into());
            Ok(())
        }

        async fn load_cipher(&mut self) -> Result<(), CollectError> {
            self.calls.push("load_cipher".into());
            if self.fail_cipher {
                return Err(CollectError::CipherLoad("blocked".into()));
            }
            Ok(())
        }

        async fn fetch_and_decode(&mut self, url: &Url, _key: &str) -> Result<String, FetchDecodeError> {
            self.calls.push(format!("fetch {}", url.query().unwrap_or_default()));
            self.result.clone()
        }

        async fn shutdown(&mut self) {
            self.calls.push("shutdown".into());
        }
    }

    fn config() -> CollectConfig {
        CollectConfig::new(NaiveDate::from_ymd_opt(2026, 2, 25).unwrap())
    }

    fn payload(doc: Value) -> String {
        deflate_payload(&doc.to_string()).unwrap()
    }

    #[tokio::test]
    async fn collects_items_and_shuts_down() {
        let doc = json!({
            "live": [{ "schedules": [
                { "tv_channel": "gsshop", "start_datetime": "2026-02-25T10:00:00+09:00", "name": "b" },
                { "tv_channel": "cjmall", "start_datetime": "2026-02-25T09:00:00+09:00", "name": "a" }
            ]}]
        });
        let mut source = StubSource::returning(Ok(payload(doc)));
        let outcome = collect(&mut source, &config()).await.unwrap();

        let PipelineOutcome::Collected(report) = outcome else {
            panic!("expected data");
        };
        assert_eq!(report.date, "2026-02-25");
        assert_eq!(report.total_count, 2);
        assert_eq!(report.items[0].product_name, "a");
        assert_eq!(
            source.calls,
            vec![
                "bootstrap",
                "load_cipher",
                "fetch time_size=48&direction=down&time=2026-02-25T00%3A00%3A00",
                "shutdown"
            ]
        );
    }

    #[tokio::test]
    async fn empty_document_is_no_data() {
        let doc = json!({ "before_live": [], "live": [], "after_live": [] });
        let mut source = StubSource::returning(Ok(payload(doc.clone())));
        match collect(&mut source, &config()).await.unwrap() {
            PipelineOutcome::NoData { date, raw } => {
                assert_eq!(date, config().target_date);
                assert_eq!(raw, doc);
            }
            other => panic!("expected no data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal_after_shutdown() {
        let mut source = StubSource::returning(Err(FetchDecodeError::HttpStatus(403)));
        let err = collect(&mut source, &config()).await.unwrap_err();
        assert!(matches!(err, CollectError::Fetch(FetchDecodeError::HttpStatus(403))));
        assert_eq!(source.calls.last().map(String::as_str), Some("shutdown"));
    }

    #[tokio::test]
    async fn cipher_failure_skips_fetch() {
        let mut source = StubSource::returning(Ok(String::new()));
        source.fail_cipher = true;
        let err = collect(&mut source, &config()).await.unwrap_err();
        assert!(matches!(err, CollectError::CipherLoad(_)));
        assert_eq!(source.calls, vec!["bootstrap", "load_cipher", "shutdown"]);
    }

    #[tokio::test]
    async fn bad_base_url_is_invalid_input() {
        let mut source = StubSource::returning(Ok(String::new()));
        let config = config().with_base_url("not a url");
        let err = collect(&mut source, &config).await.unwrap_err();
        assert!(matches!(err, CollectError::InvalidInput(ref msg) if msg.contains("not a url")));
        assert_eq!(source.calls, vec!["shutdown"]);
    }

    #[tokio::test]
    async fn undecodable_plaintext_is_decode_error() {
        let mut source = StubSource::returning(Ok("not base64 zlib".into()));
        let err = collect(&mut source, &config()).await.unwrap_err();
        assert!(matches!(err, CollectError::Decode(_)));
    }
}
