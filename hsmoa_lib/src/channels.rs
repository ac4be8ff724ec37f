//! Channel code to display-name table.
//!
//! Follows the compile-time `include_str!` YAML pattern: the table lives in
//! `seed_data/channels.yml` and is parsed once per process. Codes missing from
//! the table are displayed as-is.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Error types for channel table parsing.
#[derive(Error, Debug)]
pub enum ChannelTableError {
    #[error("Failed to parse channel YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate channel code in table: {0}")]
    DuplicateCode(String),
}

/// Top-level structure for the channel YAML file.
#[derive(Deserialize, Debug)]
pub struct ChannelFile {
    pub channels: Vec<Channel>,
}

/// A single code-to-name entry.
#[derive(Deserialize, Debug, Clone)]
pub struct Channel {
    pub code: String,
    pub name: String,
}

/// Parse a channel table from YAML content.
pub fn parse_channel_table(yaml_content: &str) -> Result<HashMap<String, String>, ChannelTableError> {
    let file: ChannelFile = serde_yml::from_str(yaml_content)?;

    let mut map = HashMap::new();
    for channel in file.channels {
        if map.contains_key(&channel.code) {
            return Err(ChannelTableError::DuplicateCode(channel.code));
        }
        map.insert(channel.code, channel.name);
    }
    Ok(map)
}

/// Load the channel table from the embedded YAML file.
pub fn load_channel_table() -> Result<HashMap<String, String>, ChannelTableError> {
    let yaml_content = include_str!("../../seed_data/channels.yml");
    parse_channel_table(yaml_content)
}

/// Process-wide channel table.
pub fn channel_table() -> &'static HashMap<String, String> {
    static TABLE: OnceLock<HashMap<String, String>> = OnceLock::new();
    TABLE.get_or_init(|| {
        load_channel_table().unwrap_or_else(|e| {
            tracing::error!("Channel table unavailable, codes will display raw: {}", e);
            HashMap::new()
        })
    })
}

/// Display name for `code`, or `code` itself when the table has no entry.
pub fn resolve_channel_name(code: &str) -> String {
    channel_table()
        .get(code)
        .cloned()
        .unwrap_or_else(|| code.to_string())
}

/// Table entries sorted by code.
pub fn channel_list() -> Vec<(&'static str, &'static str)> {
    let mut entries: Vec<(&str, &str)> = channel_table()
        .iter()
        .map(|(code, name)| (code.as_str(), name.as_str()))
        .collect();
    entries.sort();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_channel_table_succeeds() {
        let table = load_channel_table().unwrap();
        assert_eq!(table.len(), 25);
    }

    #[test]
    fn test_known_codes_resolve() {
        assert_eq!(resolve_channel_name("gsshop"), "GS샵");
        assert_eq!(resolve_channel_name("cjmall"), "CJ온스타일");
        assert_eq!(resolve_channel_name("hmall"), "현대홈쇼핑");
        assert_eq!(resolve_channel_name("bshop"), "SK스토아");
    }

    #[test]
    fn test_aliases_share_names() {
        assert_eq!(resolve_channel_name("cjmyshop"), resolve_channel_name("cjmallplus"));
        assert_eq!(resolve_channel_name("lottemyshop"), resolve_channel_name("lotteonetv"));
    }

    #[test]
    fn test_unknown_code_passes_through() {
        assert_eq!(resolve_channel_name("zzzshop"), "zzzshop");
        assert_eq!(resolve_channel_name(""), "");
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let yaml = r#"
channels:
  - code: gsshop
    name: GS샵
  - code: gsshop
    name: GS
"#;
        assert!(matches!(
            parse_channel_table(yaml),
            Err(ChannelTableError::DuplicateCode(_))
        ));
    }

    #[test]
    fn test_channel_list_sorted() {
        let list = channel_list();
        assert_eq!(list.len(), 25);
        assert!(list.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
