// identity.rs — Injected sign-in state.
//
// The app shell feeds this from whatever auth SDK it uses; the crate
// only ever sees the subscription. Local implementations cover the CLI
// and tests.

use tokio::sync::watch;

/// Sign-in state as observed by the session layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn {
        /// The user's email, which doubles as their backend id.
        user_id: String,
    },
}

/// Source of sign-in state changes.
pub trait IdentityProvider: Send + Sync {
    /// Current state plus all future changes.
    fn subscribe(&self) -> watch::Receiver<SessionState>;
}

/// Provider that is permanently signed in as one user.
pub struct StaticIdentity {
    // The sender is kept so the channel stays open for late subscribers.
    _tx: watch::Sender<SessionState>,
    rx: watch::Receiver<SessionState>,
}

impl StaticIdentity {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let (tx, rx) = watch::channel(SessionState::SignedIn {
            user_id: user_id.into(),
        });
        Self { _tx: tx, rx }
    }
}

impl IdentityProvider for StaticIdentity {
    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.rx.clone()
    }
}

/// Switchable in-process provider for tests and demos.
#[derive(Clone)]
pub struct LocalIdentity {
    tx: watch::Sender<SessionState>,
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalIdentity {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::SignedOut);
        Self { tx }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let _ = self.tx.send(SessionState::SignedIn {
            user_id: user_id.into(),
        });
    }

    pub fn sign_out(&self) {
        let _ = self.tx.send(SessionState::SignedOut);
    }
}

impl IdentityProvider for LocalIdentity {
    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_identity_reports_signed_in() {
        let provider = StaticIdentity::signed_in("martha@example.com");
        let rx = provider.subscribe();
        assert_eq!(
            *rx.borrow(),
            SessionState::SignedIn {
                user_id: "martha@example.com".into()
            }
        );
    }

    #[tokio::test]
    async fn test_local_identity_switches_state() {
        let provider = LocalIdentity::new();
        let mut rx = provider.subscribe();
        assert_eq!(*rx.borrow(), SessionState::SignedOut);

        provider.sign_in("sam@example.com");
        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow(),
            SessionState::SignedIn {
                user_id: "sam@example.com".into()
            }
        );

        provider.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::SignedOut);
    }
}
