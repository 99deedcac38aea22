//! Session state machine: online sign-in, offline demo, and sign-out.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::auth::AuthProvider;
use crate::models::Identity;
use crate::offline::LocalNoteStore;
use crate::state::SessionState;
use crate::{Error, Result};

/// Owns the auth provider and the offline store for one app session and
/// publishes every transition on a watch channel.
pub struct Session {
    auth: Arc<dyn AuthProvider>,
    local: LocalNoteStore,
    state: watch::Sender<SessionState>,
    /// Serializes transitions
    transition: Mutex<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Session")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(auth: Arc<dyn AuthProvider>, local: LocalNoteStore) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            auth,
            local,
            state,
            transition: Mutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn local_store(&self) -> &LocalNoteStore {
        &self.local
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let _guard = self.transition.lock().await;
        self.require_unauthenticated("sign in")?;
        let identity = self.auth.sign_in(email, password).await?;
        self.state.send_replace(SessionState::Online(identity.clone()));
        Ok(identity)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let _guard = self.transition.lock().await;
        self.require_unauthenticated("sign up")?;
        let identity = self.auth.sign_up(email, password).await?;
        self.state.send_replace(SessionState::Online(identity.clone()));
        Ok(identity)
    }

    /// Sign in online, falling back to demo mode when the auth provider is
    /// unreachable. Credential errors still fail.
    pub async fn sign_in_or_demo(&self, email: &str, password: &str) -> Result<SessionState> {
        match self.sign_in(email, password).await {
            Ok(_) => Ok(self.state()),
            Err(error) if error.is_unavailable() => {
                tracing::warn!("Auth provider unavailable, switching to demo mode: {error}");
                self.activate_demo().await?;
                Ok(self.state())
            }
            Err(error) => Err(error),
        }
    }

    /// Enter offline demo mode, initializing the local store. Leaving an
    /// online session signs the remote user out first.
    pub async fn activate_demo(&self) -> Result<Identity> {
        let _guard = self.transition.lock().await;
        let current = self.state();
        match current {
            SessionState::OfflineDemo(identity) => return Ok(identity),
            SessionState::Online(identity) => {
                if let Err(error) = self.auth.sign_out().await {
                    tracing::warn!("Remote sign-out for {} failed: {error}", identity.uid);
                }
            }
            SessionState::Unauthenticated => {}
        }

        self.local.initialize();
        let identity = self.local.demo_user().clone();
        self.state
            .send_replace(SessionState::OfflineDemo(identity.clone()));
        tracing::info!("Offline demo mode active");
        Ok(identity)
    }

    /// Return to `Unauthenticated`. Leaving demo mode erases demo data.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.transition.lock().await;
        match self.state() {
            SessionState::Unauthenticated => return Ok(()),
            SessionState::Online(_) => self.auth.sign_out().await?,
            SessionState::OfflineDemo(_) => self.local.clear_demo_data(),
        }
        self.state.send_replace(SessionState::Unauthenticated);
        Ok(())
    }

    fn require_unauthenticated(&self, action: &str) -> Result<()> {
        match &*self.state.borrow() {
            SessionState::Unauthenticated => Ok(()),
            SessionState::Online(identity) | SessionState::OfflineDemo(identity) => {
                Err(Error::ModeMismatch(format!(
                    "cannot {action} while signed in as {}",
                    identity.uid
                )))
            }
        }
    }
}
