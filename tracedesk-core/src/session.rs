//! Session context
//!
//! Holds the bearer token and role handed out by the server at login. A
//! session is created once at start-up with [`Session::init`], which reads
//! whatever the previous run persisted, and is cleared with
//! [`Session::teardown`] on logout or when the server rejects the token.
//!
//! The gateway and the auth service share one session through a
//! [`SessionHandle`], so a 401 seen by any service logs every service out.

use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};

use crate::storage::StateStorage;

/// Role stored after a successful user login
pub const USER_ROLE: &str = "user";

#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    role: Option<String>,
    storage: Option<StateStorage>,
}

impl Session {
    /// Start a session from the persisted state file
    pub fn init(storage: StateStorage) -> Result<Self> {
        let state = storage.load()?;
        log::debug!(
            "Session initialised from {:?} (authenticated: {})",
            storage.path(),
            state.auth_token.is_some()
        );
        Ok(Self {
            token: state.auth_token,
            role: state.user_role,
            storage: Some(storage),
        })
    }

    /// A session that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header, when a token is held
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Record a freshly issued token and role, persisting both
    pub fn establish(&mut self, token: String, role: String) -> Result<()> {
        self.token = Some(token.clone());
        self.role = Some(role.clone());
        if let Some(storage) = &self.storage {
            storage.update(|state| {
                state.auth_token = Some(token);
                state.user_role = Some(role);
            })?;
        }
        Ok(())
    }

    /// Clear token and role. Memory is cleared even if the state file
    /// cannot be updated; the write error is still returned.
    pub fn teardown(&mut self) -> Result<()> {
        self.token = None;
        self.role = None;
        if let Some(storage) = &self.storage {
            storage.update(|state| {
                state.auth_token = None;
                state.user_role = None;
            })?;
        }
        Ok(())
    }
}

/// Shared, cloneable access to one [`Session`]
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<RwLock<Session>>);

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self(Arc::new(RwLock::new(session)))
    }

    pub fn token(&self) -> Option<String> {
        self.read(|s| s.token.clone())
    }

    pub fn role(&self) -> Option<String> {
        self.read(|s| s.role.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(Session::is_authenticated)
    }

    pub fn authorization_header(&self) -> Option<String> {
        self.read(Session::authorization_header)
    }

    pub fn establish(&self, token: String, role: String) -> Result<()> {
        self.write(|s| s.establish(token, role))
    }

    pub fn teardown(&self) -> Result<()> {
        self.write(Session::teardown)
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalState;
    use crate::theme::Theme;
    use tempfile::TempDir;

    #[test]
    fn test_init_reads_persisted_token() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("state.yaml"));
        storage
            .save(&LocalState {
                auth_token: Some("tok".into()),
                user_role: Some("user".into()),
                theme: None,
            })
            .unwrap();

        let session = Session::init(storage).unwrap();
        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.role(), Some("user"));
        assert_eq!(session.authorization_header().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn test_establish_and_teardown_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.yaml");
        let storage = StateStorage::new(&path);
        storage
            .save(&LocalState {
                theme: Some(Theme::Dark),
                ..Default::default()
            })
            .unwrap();

        let handle = SessionHandle::new(Session::init(storage.clone()).unwrap());
        assert!(!handle.is_authenticated());

        handle.establish("tok".into(), USER_ROLE.into()).unwrap();
        assert_eq!(storage.load().unwrap().auth_token.as_deref(), Some("tok"));

        handle.teardown().unwrap();
        assert!(!handle.is_authenticated());
        assert!(handle.role().is_none());

        let state = storage.load().unwrap();
        assert!(state.auth_token.is_none());
        assert!(state.user_role.is_none());
        // Theme survives logout
        assert_eq!(state.theme, Some(Theme::Dark));
    }

    #[test]
    fn test_clones_share_state() {
        let handle = SessionHandle::new(Session::in_memory());
        let other = handle.clone();

        handle.establish("tok".into(), USER_ROLE.into()).unwrap();
        assert_eq!(other.token().as_deref(), Some("tok"));

        other.teardown().unwrap();
        assert!(handle.token().is_none());
    }
}
