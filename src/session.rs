// session.rs — Ties identity changes to board lifecycle.
//
// A `UserSession` watches an `IdentityProvider` and keeps at most one
// `TaskBoard` alive: sign-in builds a board for that user, loads it, and
// starts the change-feed reload task; sign-out tears both down. Consumers
// poll `board()` for the current board rather than holding one across a
// sign-out.

use crate::{
    api::BackendClient,
    board::TaskBoard,
    identity::{IdentityProvider, SessionState},
    watch::{self, ChangeFeed},
};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::{
    sync::{watch as watch_ch, RwLock},
    task::JoinHandle,
};
use tracing::{info, warn};

// ─── Session ─────────────────────────────────────────────────────────────────

pub struct UserSession {
    board: Arc<RwLock<Option<Arc<TaskBoard>>>>,
    /// Reload task for the signed-in user's change feed. Shared with the
    /// driver so either side can cancel it.
    feed_task: Arc<StdMutex<Option<JoinHandle<()>>>>,
    driver: JoinHandle<()>,
}

impl UserSession {
    /// Start watching `provider` and managing boards against `client`.
    ///
    /// The returned session owns the driver task; dropping it stops the
    /// driver and any running change-feed task.
    pub fn spawn(
        provider: Arc<dyn IdentityProvider>,
        client: BackendClient,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        let board = Arc::new(RwLock::new(None));
        let feed_task = Arc::new(StdMutex::new(None));
        let driver = tokio::spawn(drive(
            provider.subscribe(),
            client,
            feed,
            board.clone(),
            feed_task.clone(),
        ));
        Self {
            board,
            feed_task,
            driver,
        }
    }

    /// Board for the currently signed-in user, if any.
    pub async fn board(&self) -> Option<Arc<TaskBoard>> {
        self.board.read().await.clone()
    }
}

impl Drop for UserSession {
    fn drop(&mut self) {
        self.driver.abort();
        if let Ok(mut guard) = self.feed_task.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

async fn drive(
    mut rx: watch_ch::Receiver<SessionState>,
    client: BackendClient,
    feed: Arc<dyn ChangeFeed>,
    board_slot: Arc<RwLock<Option<Arc<TaskBoard>>>>,
    feed_task: Arc<StdMutex<Option<JoinHandle<()>>>>,
) {
    loop {
        let state = rx.borrow_and_update().clone();
        match state {
            SessionState::SignedIn { user_id } => {
                info!(user = %user_id, "signed in, loading board");
                let board = Arc::new(TaskBoard::new(client.clone(), user_id.clone()));
                if let Err(err) = board.refresh().await {
                    // The board stays usable; the change feed or a manual
                    // reload will fill it in once the backend is reachable.
                    warn!(user = %user_id, error = %err, "initial task load failed");
                }
                let reload = watch::spawn_reload_on_change(feed.clone(), board.clone());
                swap_feed_task(&feed_task, Some(reload));
                *board_slot.write().await = Some(board);
            }
            SessionState::SignedOut => {
                info!("signed out, clearing board");
                swap_feed_task(&feed_task, None);
                *board_slot.write().await = None;
            }
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn swap_feed_task(slot: &StdMutex<Option<JoinHandle<()>>>, next: Option<JoinHandle<()>>) {
    let mut guard = slot.lock().expect("change feed task slot poisoned");
    if let Some(old) = guard.take() {
        old.abort();
    }
    *guard = next;
}

// ─── Tests ───────────────────────────────────────────────────────────────────
