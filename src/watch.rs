// SPDX-License-Identifier: MIT
//
// watch.rs — External change notifications for a user's task list.
//
// The backend keeps a per-user revision that bumps whenever one of their
// tasks changes. Subscribing yields those bumps as a stream; the only
// reaction is ever a full board reload, so missing an event is harmless
// as long as a later one arrives.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::board::TaskBoard;
use crate::error::Result;

/// A change notification for one user's task list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Monotone per-user revision. Gaps are fine.
    pub revision: u64,
}

/// Stream of change notifications.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, user_id: &str) -> Result<BoxStream<'static, ChangeEvent>>;
}

// ─── SSE feed ────────────────────────────────────────────────────────────────

/// Feed backed by the backend's `GET /tasks/{email}/events` SSE stream.
///
/// Reconnects with a fixed short delay whenever the connection drops.
/// There is no backoff; the stream is idle-cheap and the server sends
/// keep-alives.
pub struct SseChangeFeed {
    http: reqwest::Client,
    base_url: String,
    reconnect_delay: Duration,
}

impl SseChangeFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            reconnect_delay: Duration::from_secs(2),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

struct FeedState {
    http: reqwest::Client,
    url: String,
    delay: Duration,
    conn: Option<BoxStream<'static, reqwest::Result<Vec<u8>>>>,
    buf: String,
}

#[async_trait]
impl ChangeFeed for SseChangeFeed {
    async fn subscribe(&self, user_id: &str) -> Result<BoxStream<'static, ChangeEvent>> {
        let state = FeedState {
            http: self.http.clone(),
            url: format!("{}/tasks/{}/events", self.base_url, user_id),
            delay: self.reconnect_delay,
            conn: None,
            buf: String::new(),
        };

        let stream = stream::unfold(state, |mut st| async move {
            loop {
                // Emit any frame already buffered before reading more.
                if let Some(pos) = st.buf.find("\n\n") {
                    let frame: String = st.buf.drain(..pos + 2).collect();
                    if let Some(event) = parse_sse_frame(&frame) {
                        return Some((event, st));
                    }
                    continue;
                }

                match st.conn.as_mut() {
                    None => match st.http.get(&st.url).send().await {
                        Ok(resp) if resp.status().is_success() => {
                            debug!(url = %st.url, "change feed connected");
                            st.buf.clear();
                            st.conn =
                                Some(resp.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed());
                        }
                        Ok(resp) => {
                            debug!(status = %resp.status(), "change feed rejected, retrying");
                            tokio::time::sleep(st.delay).await;
                        }
                        Err(err) => {
                            debug!(error = %err, "change feed connect failed, retrying");
                            tokio::time::sleep(st.delay).await;
                        }
                    },
                    Some(conn) => match conn.next().await {
                        Some(Ok(chunk)) => st.buf.push_str(&String::from_utf8_lossy(&chunk)),
                        Some(Err(err)) => {
                            debug!(error = %err, "change feed dropped, reconnecting");
                            st.conn = None;
                            tokio::time::sleep(st.delay).await;
                        }
                        None => {
                            debug!("change feed closed, reconnecting");
                            st.conn = None;
                            tokio::time::sleep(st.delay).await;
                        }
                    },
                }
            }
        });

        Ok(stream.boxed())
    }
}

/// Extract a change event from one SSE frame. Comment lines and event
/// name fields are skipped; a frame without a parseable data payload
/// yields nothing.
fn parse_sse_frame(frame: &str) -> Option<ChangeEvent> {
    let mut data = String::new();
    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        }
    }
    if data.is_empty() {
        return None;
    }
    serde_json::from_str(&data).ok()
}

// ─── Local feed ──────────────────────────────────────────────────────────────

/// In-process feed backed by a broadcast channel. Tests and demos
/// publish revisions directly.
#[derive(Clone)]
pub struct LocalChangeFeed {
    tx: broadcast::Sender<(String, u64)>,
}

impl Default for LocalChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Announce that `user_id`'s task list changed.
    pub fn publish(&self, user_id: &str, revision: u64) {
        let _ = self.tx.send((user_id.to_string(), revision));
    }
}

#[async_trait]
impl ChangeFeed for LocalChangeFeed {
    async fn subscribe(&self, user_id: &str) -> Result<BoxStream<'static, ChangeEvent>> {
        let user = user_id.to_string();
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| {
            let user = user.clone();
            async move {
                match item {
                    Ok((uid, revision)) if uid == user => Some(ChangeEvent { revision }),
                    // Other users' bumps and lag errors are skipped; the
                    // next matching event catches the board up anyway.
                    _ => None,
                }
            }
        });
        Ok(stream.boxed())
    }
}

// ─── Reload driver ───────────────────────────────────────────────────────────

/// Drive a board from a change feed until the task is aborted.
///
/// Each event triggers a full reload. A failed reload is logged and the
/// loop keeps going; the next event retries naturally.
pub fn spawn_reload_on_change(
    feed: Arc<dyn ChangeFeed>,
    board: Arc<TaskBoard>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = match feed.subscribe(board.user_id()).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(user = %board.user_id(), error = %err, "change feed subscription failed");
                return;
            }
        };
        while let Some(event) = stream.next().await {
            debug!(user = %board.user_id(), revision = event.revision, "change notification");
            if let Err(err) = board.refresh().await {
                warn!(user = %board.user_id(), error = %err, "reload after change notification failed");
            }
        }
    })
}
