//! Menu configuration handling

use alloc::string::String;
use alloc::vec::Vec;
use core::str;

use log::warn;

use crate::bootenv::{BootEnvironment, SortKey, SortOrder};
use crate::console::Viewport;

/// Maximum number of boot environments read from a config file
pub const MAX_ENTRIES: usize = 64;

/// Seconds before the default environment boots
pub const DEFAULT_TIMEOUT: u32 = 10;

/// Configuration file paths to try
pub const CONFIG_PATHS: &[&str] = &[
    // 8.3-safe names first, some firmware FAT drivers lack LFN support.
    "\\EFI\\raven\\bootenv.cfg",
    "\\EFI\\raven\\bootenv.conf",
    "\\EFI\\BOOT\\bootenv.cfg",
    "\\raven\\bootenv.cfg",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration is not valid UTF-8")]
    InvalidUtf8,
    #[error("line {line}: invalid value for '{key}'")]
    InvalidValue { line: usize, key: String },
}

/// Menu configuration
#[derive(Debug, Clone)]
pub struct MenuConfig {
    pub entries: Vec<BootEnvironment>,
    /// `None` waits for the operator indefinitely
    pub timeout: Option<u32>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub viewport: Viewport,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            sort_key: SortKey::Timestamp,
            sort_order: SortOrder::Descending,
            viewport: Viewport::new(1, 2, 8, 76),
        }
    }
}

/// `[bootenv]` section being filled in
#[derive(Default)]
struct EntryDraft {
    name: String,
    path: String,
    object_id: u64,
    created_at: u64,
    active: bool,
}

impl EntryDraft {
    fn finish(self, entries: &mut Vec<BootEnvironment>) {
        if self.name.is_empty() {
            warn!("config: dropping boot environment without a name");
            return;
        }
        if entries.len() >= MAX_ENTRIES {
            warn!("config: too many boot environments, dropping '{}'", self.name);
            return;
        }
        entries.push(
            BootEnvironment::new(&self.name, self.object_id, self.created_at)
                .with_path(&self.path)
                .with_active(self.active),
        );
    }
}

impl MenuConfig {
    /// Parse configuration from file contents
    pub fn parse(data: &[u8]) -> Result<MenuConfig, ConfigError> {
        // Configuration file format (bootenv.cfg):
        //
        // timeout = 10
        // sort = timestamp
        // order = descending
        //
        // [bootenv]
        // name = "default"
        // path = "rpool/ROOT/default"
        // objnum = 1234
        // timestamp = 1700000000
        // active = yes

        let text = str::from_utf8(data).map_err(|_| ConfigError::InvalidUtf8)?;

        let mut config = MenuConfig::default();
        let mut current: Option<EntryDraft> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line == "[bootenv]" {
                if let Some(entry) = current.take() {
                    entry.finish(&mut config.entries);
                }
                current = Some(EntryDraft::default());
                continue;
            }

            let Some((key, value)) = parse_key_value(line) else {
                continue;
            };
            let invalid = || ConfigError::InvalidValue {
                line: line_no,
                key: String::from(key),
            };

            if let Some(ref mut entry) = current {
                match key {
                    "name" => entry.name = String::from(value),
                    "path" => entry.path = String::from(value),
                    "objnum" => entry.object_id = value.parse().map_err(|_| invalid())?,
                    "timestamp" => entry.created_at = value.parse().map_err(|_| invalid())?,
                    "active" => entry.active = parse_bool(value).ok_or_else(invalid)?,
                    _ => {}
                }
            } else {
                match key {
                    "timeout" => config.timeout = parse_timeout(value).ok_or_else(invalid)?,
                    "sort" => config.sort_key = parse_sort_key(value).ok_or_else(invalid)?,
                    "order" => config.sort_order = parse_sort_order(value).ok_or_else(invalid)?,
                    "row" => config.viewport.origin.row = value.parse().map_err(|_| invalid())?,
                    "col" => config.viewport.origin.col = value.parse().map_err(|_| invalid())?,
                    "rows" => config.viewport.rows = value.parse().map_err(|_| invalid())?,
                    "cols" => config.viewport.cols = value.parse().map_err(|_| invalid())?,
                    _ => {}
                }
            }
        }

        // Save final entry
        if let Some(entry) = current {
            entry.finish(&mut config.entries);
        }

        if config.viewport.rows < 3 {
            warn!("config: viewport needs 3 rows, got {}", config.viewport.rows);
            config.viewport.rows = 3;
        }

        Ok(config)
    }
}

/// Parse a key = value line, handling quoted values
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    // Remove quotes if present
    let value = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    };

    Some((key, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn parse_timeout(value: &str) -> Option<Option<u32>> {
    match value {
        "-1" | "off" | "none" => Some(None),
        _ => value.parse().ok().map(Some),
    }
}

fn parse_sort_key(value: &str) -> Option<SortKey> {
    match value {
        "objnum" | "object" => Some(SortKey::ObjectId),
        "timestamp" | "time" => Some(SortKey::Timestamp),
        "name" => Some(SortKey::Name),
        _ => None,
    }
}

fn parse_sort_order(value: &str) -> Option<SortOrder> {
    match value {
        "ascending" | "asc" => Some(SortOrder::Ascending),
        "descending" | "desc" => Some(SortOrder::Descending),
        _ => None,
    }
}
