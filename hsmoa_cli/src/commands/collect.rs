use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;
use hsmoa_lib::validation::{default_target_date, validate_date};
use hsmoa_lib::{
    collect, BrowserOptions, BrowserSource, Client, CollectConfig, HttpSource, PipelineOutcome,
    ScheduleSource, DEFAULT_BASE_URL,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::output::{
    print_json, print_sample_table, print_summary, write_csv_report, write_json_report,
    write_raw_dump, write_xlsx_report, OutputFormat,
};

/// Exit status for a run that decoded but found nothing to report.
pub const EXIT_NO_DATA: u8 = 3;

#[derive(Args)]
pub struct CollectArgs {
    /// Target date as YYYYMMDD (default: tomorrow in KST)
    #[arg(long)]
    pub date: Option<String>,

    /// Directory for schedule and diagnostic files
    #[arg(long, env = "HSMOA_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Session source: browser (headless Chromium) or http
    #[arg(long, env = "HSMOA_SOURCE", default_value = "browser")]
    pub source: String,

    /// Site origin
    #[arg(long, env = "HSMOA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Chromium executable to launch
    #[arg(long, env = "CHROME")]
    pub chrome: Option<PathBuf>,
}

fn build_source(args: &CollectArgs) -> Result<Box<dyn ScheduleSource>> {
    match args.source.as_str() {
        "browser" => {
            let options = BrowserOptions::default()
                .with_base_url(&args.base_url)
                .headless(!args.headful)
                .with_chrome_executable(args.chrome.clone());
            Ok(Box::new(BrowserSource::new(options)))
        }
        "http" => {
            let client = Client::with_base_url(&args.base_url)?;
            Ok(Box::new(HttpSource::new(client)))
        }
        other => bail!("unknown source '{}'. Valid values: browser, http", other),
    }
}

fn target_date(args: &CollectArgs) -> Result<NaiveDate> {
    match &args.date {
        Some(raw) => Ok(validate_date(raw)?),
        None => Ok(default_target_date(Utc::now())),
    }
}

pub async fn run(args: &CollectArgs, format: &OutputFormat) -> Result<ExitCode> {
    let date = target_date(args)?;
    let mut source = build_source(args)?;
    let config = CollectConfig::new(date).with_base_url(&args.base_url);

    eprintln!("hsmoa schedule collector: {}", date.format("%Y-%m-%d"));
    std::fs::create_dir_all(&args.output_dir)?;
    tracing::debug!("Writing output to {}", args.output_dir.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("collecting schedule via {}...", args.source));
    let outcome = collect(source.as_mut(), &config).await;
    pb.finish_and_clear();

    match outcome? {
        PipelineOutcome::Collected(report) => {
            eprintln!("{} items for {}", report.total_count, report.date);
            let json_path = write_json_report(&args.output_dir, date, &report)?;
            let xlsx_path = write_xlsx_report(&args.output_dir, date, &report.items)?;
            let csv_path = write_csv_report(&args.output_dir, date, &report.items)?;

            print_summary(&report, &[json_path, xlsx_path, csv_path]);
            match format {
                OutputFormat::Table => print_sample_table(&report.items),
                OutputFormat::Json => print_json(&report),
                OutputFormat::None => {}
            }
            Ok(ExitCode::SUCCESS)
        }
        PipelineOutcome::NoData { date, raw } => {
            let path = write_raw_dump(&args.output_dir, date, &raw)?;
            eprintln!("No schedule items for {}", date.format("%Y-%m-%d"));
            eprintln!("Raw document saved to {}", path.display());
            Ok(ExitCode::from(EXIT_NO_DATA))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(source: &str, date: Option<&str>) -> CollectArgs {
        CollectArgs {
            date: date.map(String::from),
            output_dir: PathBuf::from("output"),
            source: source.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            headful: false,
            chrome: None,
        }
    }

    #[test]
    fn explicit_date_is_validated() {
        let date = target_date(&args("http", Some("20260225"))).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 25).unwrap());
        assert!(target_date(&args("http", Some("2026-02-25"))).is_err());
    }

    #[test]
    fn unknown_source_is_rejected() {
        let err = build_source(&args("curl", None)).err().unwrap();
        assert!(err.to_string().contains("unknown source 'curl'"));
    }

    #[test]
    fn known_sources_build() {
        assert!(build_source(&args("http", None)).is_ok());
        assert!(build_source(&args("browser", None)).is_ok());
    }
}
