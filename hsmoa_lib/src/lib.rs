//! Library layer for the hsmoa schedule collector: session-backed sources,
//! record normalization, and the collection pipeline.
//!
//! Wraps the `hsmoa_api` protocol crate with a browser-driven source, the
//! channel table, dedup/sort, and input validation.

pub mod browser;
pub mod channels;
pub mod delay;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod source;
pub mod validation;

pub use hsmoa_api;
pub use hsmoa_api::types;
pub use hsmoa_api::{Client, ScheduleQuery, DEFAULT_BASE_URL};

pub use browser::{BrowserError, BrowserOptions, BrowserSource};
pub use delay::SettleDelay;
pub use error::CollectError;
pub use normalize::{Price, ScheduleItem};
pub use pipeline::{collect, CollectConfig, PipelineOutcome};
pub use report::{ScheduleReport, ScheduleSummary};
pub use source::{FetchDecodeError, HttpSource, ScheduleSource};
