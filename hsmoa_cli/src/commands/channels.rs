use anyhow::Result;
use hsmoa_lib::channels::channel_list;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::output::{print_json, OutputFormat};

#[derive(Tabled, Serialize)]
struct ChannelRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
}

fn build_channel_rows() -> Vec<ChannelRow> {
    channel_list()
        .into_iter()
        .map(|(code, name)| ChannelRow {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Prints the channel code table.
pub fn run(format: &OutputFormat) -> Result<()> {
    let rows = build_channel_rows();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table | OutputFormat::None => {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }
    Ok(())
}
