//! Authentication provider capability and an in-process implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::models::Identity;
use crate::subscription::{Listener, ListenerRegistry, Subscription};
use crate::{Error, Result};

const MIN_PASSWORD_LEN: usize = 6;

/// Callback receiving the signed-in identity, or `None` after sign-out.
pub type AuthListener = Listener<Option<Identity>>;

/// The remote auth collaborator: sign-in, sign-up, sign-out, and an
/// auth-state stream.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;

    fn current_user(&self) -> Option<Identity>;

    /// Deliver the current identity immediately, then every change.
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription;
}

/// Accounts held in process memory, with a switch to simulate the provider
/// being unreachable.
pub struct MemoryAuthProvider {
    state: Mutex<AuthState>,
    listeners: ListenerRegistry<Option<Identity>>,
}

struct AuthState {
    /// Keyed by lowercased email
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    available: bool,
    version: u64,
}

struct Account {
    password: String,
    identity: Identity,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(AuthState {
                accounts: HashMap::new(),
                current: None,
                available: true,
                version: 1,
            }),
            listeners: ListenerRegistry::new(),
        }
    }
}

impl fmt::Debug for MemoryAuthProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        formatter
            .debug_struct("MemoryAuthProvider")
            .field("accounts", &state.accounts.len())
            .field("current", &state.current.as_ref().map(|user| &user.uid))
            .field("available", &state.available)
            .finish()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unavailable every call fails with `BackingStoreUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Replace the signed-in identity and notify listeners outside the lock.
    fn publish(&self, mut state: MutexGuard<'_, AuthState>, current: Option<Identity>) {
        state.current = current;
        state.version += 1;
        let (version, current) = (state.version, state.current.clone());
        drop(state);
        self.listeners.notify_all(version, &current);
    }

    fn check_available(state: &AuthState) -> Result<()> {
        if state.available {
            Ok(())
        } else {
            Err(Error::BackingStoreUnavailable(
                "auth provider is unreachable".to_string(),
            ))
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        validate_credentials(email, password)?;
        let state = self.lock();
        Self::check_available(&state)?;

        let identity = state
            .accounts
            .get(&account_key(email))
            .filter(|account| account.password == password)
            .map(|account| account.identity.clone())
            .ok_or_else(|| Error::Auth("Invalid email or password".to_string()))?;

        self.publish(state, Some(identity.clone()));
        tracing::info!("Signed in as {}", identity.uid);
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        validate_credentials(email, password)?;
        validate_new_password(password)?;
        let mut state = self.lock();
        Self::check_available(&state)?;

        let key = account_key(email);
        if state.accounts.contains_key(&key) {
            return Err(Error::Auth("Email is already registered".to_string()));
        }

        let identity = Identity {
            uid: uuid::Uuid::now_v7().to_string(),
            email: Some(email.trim().to_string()),
            display_name: None,
            email_verified: false,
            is_anonymous: false,
        };
        state.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );

        self.publish(state, Some(identity.clone()));
        tracing::info!("Registered account {}", identity.uid);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        let state = self.lock();
        Self::check_available(&state)?;
        self.publish(state, None);
        Ok(())
    }

    fn current_user(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription {
        let (id, version, current) = {
            let state = self.lock();
            let id = self.listeners.register(listener);
            (id, state.version, state.current.clone())
        };
        self.listeners.notify_one(id, version, &current);
        self.listeners.subscription(id)
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject empty fields and malformed emails before any provider call.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::InvalidInput("Please fill in all fields".to_string()));
    }
    if !email.contains('@') {
        return Err(Error::InvalidInput(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

fn validate_new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::subscription::listener;

    #[tokio::test]
    async fn sign_up_then_sign_in_returns_same_identity() {
        let auth = MemoryAuthProvider::new();
        let created = auth.sign_up("Ada@Example.com", "secret1").await.unwrap();
        auth.sign_out().await.unwrap();
        assert_eq!(auth.current_user(), None);

        let signed_in = auth.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in, created);
        assert!(!signed_in.is_anonymous);
        assert_eq!(auth.current_user(), Some(created));
    }

    #[tokio::test]
    async fn rejects_bad_credentials() {
        let auth = MemoryAuthProvider::new();
        auth.sign_up("ada@example.com", "secret1").await.unwrap();

        let error = auth.sign_in("ada@example.com", "wrong!!").await.unwrap_err();
        assert!(matches!(error, Error::Auth(_)));

        let error = auth.sign_in("", "secret1").await.unwrap_err();
        assert_eq!(error.to_string(), "Invalid input: Please fill in all fields");

        let error = auth.sign_up("bob@example.com", "short").await.unwrap_err();
        assert!(error.to_string().contains("at least 6 characters"));

        let error = auth.sign_up("ada@example.com", "another1").await.unwrap_err();
        assert!(matches!(error, Error::Auth(_)));
    }

    #[tokio::test]
    async fn unavailable_provider_reports_connectivity() {
        let auth = MemoryAuthProvider::new();
        auth.set_available(false);
        let error = auth.sign_in("ada@example.com", "secret1").await.unwrap_err();
        assert!(error.is_unavailable());
    }

    #[tokio::test]
    async fn listeners_see_current_identity_then_changes() {
        let auth = MemoryAuthProvider::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = auth.on_auth_state_changed(listener(move |user: Option<Identity>| {
            sink.lock().unwrap().push(user.map(|user| user.uid));
        }));

        let identity = auth.sign_up("ada@example.com", "secret1").await.unwrap();
        auth.sign_out().await.unwrap();
        subscription.unsubscribe();
        auth.sign_in("ada@example.com", "secret1").await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some(identity.uid), None]
        );
    }
}
