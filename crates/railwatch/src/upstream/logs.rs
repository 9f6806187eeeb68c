// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log page shapes and formatting.

use serde::Deserialize;

/// Default page size for the snapshot endpoint.
pub const DEFAULT_PAGE: u32 = 200;
/// Hard cap on a single log page.
pub const MAX_PAGE: u32 = 500;

/// One record from the environment log API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub tags: Option<LogTags>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTags {
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
}

/// Clamp a requested page size to `[1, MAX_PAGE]`.
///
/// Absent or unparsable input falls back to the default page size.
pub fn clamp_lines(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.parse::<u32>().ok()).unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
}

/// Render one entry as `"[<timestamp>] <message>"`, or the bare message when
/// no timestamp exists.
pub fn format_line(entry: &LogEntry) -> String {
    let message = entry.message.as_deref().unwrap_or_default();
    match entry.timestamp.as_deref() {
        Some(ts) if !ts.is_empty() => format!("[{ts}] {message}"),
        _ => message.to_owned(),
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
