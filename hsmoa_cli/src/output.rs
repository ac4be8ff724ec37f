use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use hsmoa_lib::report::ScheduleReport;
use hsmoa_lib::validation::DATE_FORMAT;
use hsmoa_lib::{Price, ScheduleItem};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Rows shown in the console sample.
pub const SAMPLE_SIZE: usize = 5;

/// Worksheet name of the spreadsheet export.
pub const SHEET_NAME: &str = "편성표";

/// Spreadsheet headers, in [`ScheduleRow`] field order.
pub const SCHEDULE_HEADERS: [&str; 12] = [
    "채널명",
    "방송 시작",
    "방송 종료",
    "상품명",
    "판매가(원)",
    "정가(원)",
    "브랜드",
    "카테고리",
    "이미지 URL",
    "상품 URL",
    "리뷰 수",
    "평점",
];

const MAX_COLUMN_WIDTH: usize = 60;

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    None,
}

/// Spreadsheet row. `channel_code` is internal and not exported.
#[derive(Serialize, Debug, PartialEq)]
pub struct ScheduleRow {
    #[serde(rename = "채널명")]
    pub channel: String,
    #[serde(rename = "방송 시작")]
    pub start_time: String,
    #[serde(rename = "방송 종료")]
    pub end_time: String,
    #[serde(rename = "상품명")]
    pub product_name: String,
    #[serde(rename = "판매가(원)")]
    pub price: String,
    #[serde(rename = "정가(원)")]
    pub original_price: String,
    #[serde(rename = "브랜드")]
    pub brand: String,
    #[serde(rename = "카테고리")]
    pub category: String,
    #[serde(rename = "이미지 URL")]
    pub image_url: String,
    #[serde(rename = "상품 URL")]
    pub product_url: String,
    #[serde(rename = "리뷰 수")]
    pub review_count: i64,
    #[serde(rename = "평점")]
    pub review_rating: f64,
}

/// One worksheet cell value.
#[derive(Debug, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn price(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    fn width(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
        }
    }
}

impl ScheduleRow {
    fn cells(&self) -> [Cell; 12] {
        [
            Cell::Text(self.channel.clone()),
            Cell::Text(self.start_time.clone()),
            Cell::Text(self.end_time.clone()),
            Cell::Text(self.product_name.clone()),
            Cell::price(&self.price),
            Cell::price(&self.original_price),
            Cell::Text(self.brand.clone()),
            Cell::Text(self.category.clone()),
            Cell::Text(self.image_url.clone()),
            Cell::Text(self.product_url.clone()),
            Cell::Number(self.review_count as f64),
            Cell::Number(self.review_rating),
        ]
    }
}

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "채널")]
    channel: String,
    #[tabled(rename = "시간")]
    time: String,
    #[tabled(rename = "상품")]
    product: String,
    #[tabled(rename = "판매가")]
    price: String,
}

// -- Row builders --

/// Export rows ordered by channel name, then start time.
pub fn build_schedule_rows(items: &[ScheduleItem]) -> Vec<ScheduleRow> {
    let mut rows: Vec<ScheduleRow> = items
        .iter()
        .map(|i| ScheduleRow {
            channel: i.channel.clone(),
            start_time: i.start_time.clone(),
            end_time: i.end_time.clone(),
            product_name: i.product_name.clone(),
            price: i.price.to_string(),
            original_price: i.original_price.to_string(),
            brand: i.brand.clone(),
            category: i.category.clone(),
            image_url: i.image_url.clone(),
            product_url: i.product_url.clone(),
            review_count: i.review_count,
            review_rating: i.review_rating,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.channel
            .cmp(&b.channel)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
    rows
}

fn build_sample_rows(items: &[ScheduleItem]) -> Vec<SampleRow> {
    items
        .iter()
        .take(SAMPLE_SIZE)
        .enumerate()
        .map(|(idx, i)| {
            let mut product: String = i.product_name.chars().take(45).collect();
            if !i.brand.is_empty() {
                product.push_str(&format!(" ({})", i.brand));
            }
            SampleRow {
                rank: idx + 1,
                channel: i.channel.clone(),
                time: format!("{}~{}", clock(&i.start_time), clock(&i.end_time)),
                product,
                price: format_price(&i.price),
            }
        })
        .collect()
}

/// `HH:MM` part of a `YYYY-MM-DD HH:MM` timestamp.
fn clock(timestamp: &str) -> &str {
    timestamp.get(11..16).unwrap_or("")
}

// -- Files --

pub fn schedule_json_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("schedule_{}.json", date.format(DATE_FORMAT)))
}

pub fn schedule_csv_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("schedule_{}.csv", date.format(DATE_FORMAT)))
}

pub fn schedule_xlsx_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("schedule_{}.xlsx", date.format(DATE_FORMAT)))
}

pub fn raw_dump_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("raw_{}.json", date.format(DATE_FORMAT)))
}

fn write_pretty_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Writes the report as pretty JSON to `schedule_{YYYYMMDD}.json`.
pub fn write_json_report(dir: &Path, date: NaiveDate, report: &ScheduleReport) -> Result<PathBuf> {
    let path = schedule_json_path(dir, date);
    write_pretty_json(&path, report)?;
    Ok(path)
}

/// Writes `schedule_{YYYYMMDD}.csv` with a UTF-8 BOM so spreadsheet apps
/// detect the Korean headers.
pub fn write_csv_report(dir: &Path, date: NaiveDate, items: &[ScheduleItem]) -> Result<PathBuf> {
    let path = schedule_csv_path(dir, date);
    let mut file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(b"\xEF\xBB\xBF")?;
    let mut wtr = csv::Writer::from_writer(file);
    for row in build_schedule_rows(items) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(path)
}

/// Column widths: longest header or value plus 4, capped at 60.
fn column_widths(rows: &[[Cell; 12]]) -> [usize; 12] {
    let mut widths = SCHEDULE_HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }
    widths.map(|w| (w + 4).min(MAX_COLUMN_WIDTH))
}

/// Writes `schedule_{YYYYMMDD}.xlsx` with one `편성표` sheet, bold Korean
/// headers and fitted column widths. Prices and review fields are numeric
/// cells when they parse as numbers.
pub fn write_xlsx_report(dir: &Path, date: NaiveDate, items: &[ScheduleItem]) -> Result<PathBuf> {
    let path = schedule_xlsx_path(dir, date);
    let rows: Vec<[Cell; 12]> = build_schedule_rows(items).iter().map(ScheduleRow::cells).collect();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, header) in (0u16..).zip(SCHEDULE_HEADERS) {
        sheet.write_string_with_format(0, col, header, &bold)?;
    }
    for (row_idx, row) in (1u32..).zip(&rows) {
        for (col, cell) in (0u16..).zip(row) {
            match cell {
                Cell::Text(s) => sheet.write_string(row_idx, col, s.as_str())?,
                Cell::Number(n) => sheet.write_number(row_idx, col, *n)?,
            };
        }
    }
    for (col, width) in (0u16..).zip(column_widths(&rows)) {
        sheet.set_column_width(col, width as f64)?;
    }

    workbook
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Writes the undecodable-to-items document for diagnosis.
pub fn write_raw_dump(dir: &Path, date: NaiveDate, raw: &serde_json::Value) -> Result<PathBuf> {
    let path = raw_dump_path(dir, date);
    write_pretty_json(&path, raw)?;
    Ok(path)
}

// -- Console --

pub fn print_summary(report: &ScheduleReport, files: &[PathBuf]) {
    let summary = report.summary();
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("  수집 완료!");
    println!("  날짜: {}", report.date);
    println!("  총 {}건 / {}개 채널", summary.total, summary.channels.len());
    println!("  채널: {}", summary.channels.join(", "));
    println!("  카테고리: {}", summary.categories.join(", "));
    println!(
        "  평균 판매가: {}원 (가격 있는 {}건 기준)",
        format_won(summary.average_price.unwrap_or(0.0)),
        summary.priced_count
    );
    for file in files {
        println!("  {}", file.display());
    }
    println!("{}", rule);
}

pub fn print_sample_table(items: &[ScheduleItem]) {
    println!("\n[샘플 데이터 (상위 {}건)]", SAMPLE_SIZE.min(items.len()));
    let mut table = Table::new(build_sample_rows(items));
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Whole-won amount with thousands separators, e.g. `89,000`.
fn format_won(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut out = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0.0 && out != "0" {
        out.insert(0, '-');
    }
    out
}

fn format_price(price: &Price) -> String {
    match price.as_amount() {
        Some(amount) if amount > 0.0 => format!("{}원", format_won(amount)),
        _ => "미정".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsmoa_lib::normalize::normalize_item;
    use serde_json::json;

    fn items() -> Vec<ScheduleItem> {
        [
            json!({
                "tv_channel": "gsshop", "name": "기능성 등산화",
                "start_datetime": "2026-02-25T10:00:00+09:00",
                "end_datetime": "2026-02-25T11:00:00+09:00",
                "sale_price": 49900, "category1": "스포츠"
            }),
            json!({
                "tv_channel": "cjmall", "name": "프리미엄 한우 세트", "brand": "한우명가",
                "start_datetime": "2026-02-25T10:00:00+09:00",
                "end_datetime": "2026-02-25T11:00:00+09:00",
                "sale_price": 89000, "price": 129000, "review_count": 120
            }),
            json!({
                "tv_channel": "gsshop", "name": "심야 특가",
                "start_datetime": "2026-02-25T01:00:00+09:00",
                "end_datetime": "2026-02-25T02:00:00+09:00"
            }),
        ]
        .iter()
        .map(|v| normalize_item(v.as_object().unwrap()))
        .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hsmoa_cli_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_format_won() {
        assert_eq!(format_won(0.0), "0");
        assert_eq!(format_won(999.0), "999");
        assert_eq!(format_won(49900.0), "49,900");
        assert_eq!(format_won(1234567.4), "1,234,567");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(&Price::Amount(89000.into())), "89,000원");
        assert_eq!(format_price(&Price::default()), "미정");
    }

    #[test]
    fn test_rows_sorted_by_channel_then_time() {
        let rows = build_schedule_rows(&items());
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.channel.as_str(), r.start_time.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("CJ온스타일", "2026-02-25 10:00"),
                ("GS샵", "2026-02-25 01:00"),
                ("GS샵", "2026-02-25 10:00"),
            ]
        );
    }

    #[test]
    fn test_sample_rows_format() {
        let rows = build_sample_rows(&items());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time, "10:00~11:00");
        assert_eq!(rows[0].price, "49,900원");
        assert_eq!(rows[1].product, "프리미엄 한우 세트 (한우명가)");
        assert_eq!(rows[2].price, "미정");
    }

    #[test]
    fn test_clock_handles_empty_timestamps() {
        assert_eq!(clock(""), "");
        assert_eq!(clock("2026-02-25 09:30"), "09:30");
    }

    #[test]
    fn test_csv_has_korean_headers_and_no_channel_code() {
        let dir = scratch_dir("csv");
        let path = write_csv_report(&dir, date(), &items()).unwrap();
        assert!(path.ends_with("schedule_20260225.csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let text = text.trim_start_matches('\u{feff}');
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "채널명,방송 시작,방송 종료,상품명,판매가(원),정가(원),브랜드,카테고리,이미지 URL,상품 URL,리뷰 수,평점"
        );
        assert_eq!(text.lines().count(), 4);
        assert!(!text.contains("gsshop"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_csv_headers_match_spreadsheet_headers() {
        let dir = scratch_dir("headers");
        let path = write_csv_report(&dir, date(), &items()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.trim_start_matches('\u{feff}').lines().next().unwrap().to_string();
        assert_eq!(header, SCHEDULE_HEADERS.join(","));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_price_cells_are_numeric_when_possible() {
        let rows = build_schedule_rows(&items());
        let cells = rows[0].cells();
        assert_eq!(cells[0], Cell::Text("CJ온스타일".into()));
        assert_eq!(cells[4], Cell::Number(89000.0));
        assert_eq!(cells[5], Cell::Number(129000.0));
        assert_eq!(cells[10], Cell::Number(120.0));
        assert_eq!(Cell::price(""), Cell::Text(String::new()));
        assert_eq!(Cell::price("39,900"), Cell::Text("39,900".into()));
    }

    #[test]
    fn test_column_widths_are_padded_and_capped() {
        let mut rows: Vec<[Cell; 12]> = build_schedule_rows(&items()).iter().map(ScheduleRow::cells).collect();
        rows[0][9] = Cell::Text("x".repeat(200));
        let widths = column_widths(&rows);
        // "CJ온스타일" is 6 chars, the "채널명" header 3.
        assert_eq!(widths[0], 10);
        // "2026-02-25 10:00"
        assert_eq!(widths[1], 20);
        assert_eq!(widths[9], MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_xlsx_report_is_written() {
        let dir = scratch_dir("xlsx");
        let path = write_xlsx_report(&dir, date(), &items()).unwrap();
        assert!(path.ends_with("schedule_20260225.xlsx"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_json_report_and_raw_dump_paths() {
        let dir = scratch_dir("json");
        let at = date().and_hms_opt(9, 0, 0).unwrap();
        let report = ScheduleReport::new(date(), items(), at);

        let path = write_json_report(&dir, date(), &report).unwrap();
        assert!(path.ends_with("schedule_20260225.json"));
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["total_count"], 3);

        let raw = json!({ "live": [] });
        let path = write_raw_dump(&dir, date(), &raw).unwrap();
        assert!(path.ends_with("raw_20260225.json"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
