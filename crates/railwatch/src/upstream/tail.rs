// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log tail bridge: polls the environment log API at a fixed cadence and
//! republishes new entries as an incremental event stream.
//!
//! Each subscription owns its own polling loop and timestamp high-watermark;
//! subscriptions share nothing. A failed poll cycle is reported to the
//! subscriber and the next tick retries; the fixed interval is the retry
//! policy. Dropping the subscription cancels the loop.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::gate;
use crate::config::Config;
use crate::session::SessionRecord;
use crate::upstream::client::ApiClient;
use crate::upstream::logs::{self, LogEntry};

/// Events delivered to a tail subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailEvent {
    /// Emitted once, immediately after subscribing.
    Connected,
    /// One new log line, in chronological order.
    Line(String),
    /// A poll cycle failed; the stream continues.
    Error(String),
}

/// Parameters for one tail subscription.
#[derive(Debug, Clone)]
pub struct TailRequest {
    pub service_id: String,
    pub environment_id: String,
}

/// Split a freshly fetched page (newest first) into entries newer than the
/// watermark, returning them oldest-first together with the next watermark.
///
/// An unset watermark admits the whole page. The watermark never regresses:
/// an empty or stale page leaves it unchanged. Timestamps compare
/// lexicographically; the provider emits fixed-width ISO-8601.
pub fn advance_watermark(
    mut page: Vec<LogEntry>,
    watermark: Option<String>,
) -> (Vec<LogEntry>, Option<String>) {
    page.reverse();
    let fresh: Vec<LogEntry> = match &watermark {
        None => page,
        Some(mark) => page
            .into_iter()
            .filter(|e| e.timestamp.as_deref().is_some_and(|ts| ts > mark.as_str()))
            .collect(),
    };
    let next = fresh.iter().rev().find_map(|e| e.timestamp.clone()).or(watermark);
    (fresh, next)
}

/// Spawn a polling loop for one tail subscription.
///
/// Events arrive on the returned channel. The loop stops when `cancel` fires
/// or the receiver is dropped. The session snapshot is refreshed in memory by
/// the gate each cycle; an open stream cannot receive cookie updates.
pub fn spawn_log_tail(
    http: reqwest::Client,
    config: Config,
    mut session: SessionRecord,
    request: TailRequest,
    cancel: CancellationToken,
) -> mpsc::Receiver<TailEvent> {
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut watermark: Option<String> = None;

        if tx.send(TailEvent::Connected).await.is_err() {
            return;
        }

        let mut interval = tokio::time::interval(config.log_poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            // The first tick completes immediately, so the subscriber sees
            // the current page without waiting out an interval.
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            match poll_once(&http, &config, &mut session, &request, watermark.clone()).await {
                Ok((lines, next)) => {
                    watermark = next;
                    for line in lines {
                        if tx.send(TailEvent::Line(line)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(service = %request.service_id, err = %e, "log poll failed");
                    if tx.send(TailEvent::Error(e.to_string())).await.is_err() {
                        return;
                    }
                }
            }
        }
    });

    rx
}

/// One poll cycle: resolve a token, fetch, watermark-filter, format.
async fn poll_once(
    http: &reqwest::Client,
    config: &Config,
    session: &mut SessionRecord,
    request: &TailRequest,
    watermark: Option<String>,
) -> anyhow::Result<(Vec<String>, Option<String>)> {
    let token = gate::access_token(http, config, session)
        .await
        .ok_or_else(|| anyhow::anyhow!("Not authenticated"))?;

    let client = ApiClient::new(http, &config.api_url, &token);
    let page = client
        .fetch_log_page(&request.environment_id, &request.service_id, config.log_tail_limit)
        .await?;

    let (fresh, next) = advance_watermark(page, watermark);
    Ok((fresh.iter().map(logs::format_line).collect(), next))
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
