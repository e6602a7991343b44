use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;

use crate::auth::{ArgonScheme, CredentialScheme};
use crate::store::{KeyValueStore, AUTH_MARKER_KEY, HABITS_KEY, HABIT_LOGS_KEY, USER_KEY};
use crate::user::{Preferences, PreferencesUpdate, ProfileUpdate, User};

/// Session/identity failures. Unlike the habit repository these surface as
/// typed values the caller is expected to render.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("no account has been registered")]
    NoAccount,
    #[error("email or password is incorrect")]
    InvalidCredentials,
    #[error("no user profile is stored")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("storage operation failed: {0}")]
    Storage(String),
}

/// Owner of the single user record and of the separate auth marker. The
/// profile outlives a logout; only the marker is cleared.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    scheme: Box<dyn CredentialScheme>,
    current: RwLock<Option<User>>,
    logged_in: RwLock<bool>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_scheme(store, Box::new(ArgonScheme))
    }

    pub fn with_scheme(store: Arc<dyn KeyValueStore>, scheme: Box<dyn CredentialScheme>) -> Self {
        let session = Self {
            store,
            scheme,
            current: RwLock::new(None),
            logged_in: RwLock::new(false),
        };
        session.reload();
        session
    }

    /// Startup load: pull the stored profile and auth marker into memory.
    /// Unreadable state degrades to a logged-out session.
    pub fn reload(&self) {
        match self.read_user() {
            Ok(user) => *self.current.write() = user,
            Err(err) => {
                tracing::warn!(%err, "unable to load stored user");
                *self.current.write() = None;
            }
        }
        let marker = self.store.get(AUTH_MARKER_KEY).ok().flatten();
        *self.logged_in.write() = marker.as_deref() == Some("true");
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User, SessionError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(SessionError::Validation("name must not be empty".into()));
        }
        if !looks_like_email(email) {
            return Err(SessionError::Validation(format!(
                "`{email}` is not a valid email address"
            )));
        }
        if password.is_empty() {
            return Err(SessionError::Validation(
                "password must not be empty".into(),
            ));
        }
        // single-account store: any existing record blocks a second one
        if self.read_user()?.is_some() {
            return Err(SessionError::DuplicateAccount);
        }

        let user = User {
            id: Utc::now().timestamp_millis().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: self
                .scheme
                .hash(password)
                .map_err(|err| SessionError::Storage(err.to_string()))?,
            preferences: Preferences::default(),
        };
        self.write_user(&user)?;
        self.set_marker(true)?;
        *self.current.write() = Some(user.clone());
        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let user = self.read_user()?.ok_or(SessionError::NoAccount)?;
        let email_matches = user.email == email;
        let password_matches = self
            .scheme
            .verify(password, &user.password_hash)
            .unwrap_or(false);
        if !email_matches || !password_matches {
            return Err(SessionError::InvalidCredentials);
        }
        self.set_marker(true)?;
        *self.current.write() = Some(user.clone());
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(user)
    }

    /// Clears only the auth marker. Profile, habits and logs all survive;
    /// see `wipe_local_data` for the destructive variant.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.set_marker(false)?;
        tracing::info!("logged out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        *self.logged_in.read()
    }

    /// Shallow merge into the stored profile. A new password is re-hashed.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<User, SessionError> {
        let mut user = self.read_user()?.ok_or(SessionError::NotFound)?;
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(SessionError::Validation("name must not be empty".into()));
            }
            user.name = name;
        }
        if let Some(email) = update.email {
            let email = email.trim().to_string();
            if !looks_like_email(&email) {
                return Err(SessionError::Validation(format!(
                    "`{email}` is not a valid email address"
                )));
            }
            user.email = email;
        }
        if let Some(password) = update.password {
            if password.is_empty() {
                return Err(SessionError::Validation(
                    "password must not be empty".into(),
                ));
            }
            user.password_hash = self
                .scheme
                .hash(&password)
                .map_err(|err| SessionError::Storage(err.to_string()))?;
        }
        self.write_user(&user)?;
        *self.current.write() = Some(user.clone());
        Ok(user)
    }

    /// Nested shallow merge into the preference sub-record; fields absent
    /// from the patch keep their stored value.
    pub fn update_preferences(&self, update: PreferencesUpdate) -> Result<User, SessionError> {
        let mut user = self.read_user()?.ok_or(SessionError::NotFound)?;
        user.preferences = user.preferences.merged(&update);
        self.write_user(&user)?;
        *self.current.write() = Some(user.clone());
        Ok(user)
    }

    /// Explicit full wipe: profile, auth marker, habit and log blobs. This
    /// is never part of `logout`.
    pub fn wipe_local_data(&self) -> Result<(), SessionError> {
        for key in [USER_KEY, AUTH_MARKER_KEY, HABITS_KEY, HABIT_LOGS_KEY] {
            self.store.remove(key).map_err(storage)?;
        }
        *self.current.write() = None;
        *self.logged_in.write() = false;
        tracing::info!("local data wiped");
        Ok(())
    }

    fn read_user(&self) -> Result<Option<User>, SessionError> {
        let Some(raw) = self.store.get(USER_KEY).map_err(storage)? else {
            return Ok(None);
        };
        let user = serde_json::from_str(&raw)
            .map_err(|err| SessionError::Storage(format!("stored user is not valid JSON: {err}")))?;
        Ok(Some(user))
    }

    fn write_user(&self, user: &User) -> Result<(), SessionError> {
        let payload =
            serde_json::to_string(user).map_err(|err| SessionError::Storage(err.to_string()))?;
        self.store.set(USER_KEY, &payload).map_err(storage)
    }

    fn set_marker(&self, value: bool) -> Result<(), SessionError> {
        if value {
            self.store.set(AUTH_MARKER_KEY, "true").map_err(storage)?;
        } else {
            self.store.remove(AUTH_MARKER_KEY).map_err(storage)?;
        }
        *self.logged_in.write() = value;
        Ok(())
    }
}

fn storage(err: anyhow::Error) -> SessionError {
    SessionError::Storage(err.to_string())
}

fn looks_like_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::user::Theme;
    use chrono::NaiveTime;

    fn session() -> (Arc<MemoryStore>, SessionStore) {
        let store = Arc::new(MemoryStore::new());
        let session = SessionStore::new(store.clone());
        (store, session)
    }

    #[test]
    fn register_persists_the_user_and_marks_the_session() {
        let (store, session) = session();
        let user = session.register("A", "a@x.com", "pw1").expect("register");
        assert_eq!(user.name, "A");
        assert_ne!(user.password_hash, "pw1");
        assert!(session.is_logged_in());
        assert_eq!(
            store.get(AUTH_MARKER_KEY).expect("marker"),
            Some("true".to_string())
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (_store, session) = session();
        session.register("A", "a@x.com", "pw1").expect("register");
        let err = session.register("B", "a@x.com", "pw2").unwrap_err();
        assert!(matches!(err, SessionError::DuplicateAccount));

        let stored = session.current_user().expect("user kept");
        assert_eq!(stored.name, "A");
        assert_eq!(stored.email, "a@x.com");
    }

    #[test]
    fn register_validates_its_inputs() {
        let (_store, session) = session();
        assert!(matches!(
            session.register("", "a@x.com", "pw").unwrap_err(),
            SessionError::Validation(_)
        ));
        assert!(matches!(
            session.register("A", "not-an-email", "pw").unwrap_err(),
            SessionError::Validation(_)
        ));
        assert!(matches!(
            session.register("A", "a@x.com", "").unwrap_err(),
            SessionError::Validation(_)
        ));
    }

    #[test]
    fn login_failure_paths_are_distinguishable() {
        let (_store, session) = session();
        assert!(matches!(
            session.login("a@x.com", "pw").unwrap_err(),
            SessionError::NoAccount
        ));

        session.register("A", "a@x.com", "pw").expect("register");
        session.logout().expect("logout");

        assert!(matches!(
            session.login("a@x.com", "wrong").unwrap_err(),
            SessionError::InvalidCredentials
        ));
        assert!(matches!(
            session.login("b@x.com", "pw").unwrap_err(),
            SessionError::InvalidCredentials
        ));

        let user = session.login("a@x.com", "pw").expect("login");
        assert_eq!(user.email, "a@x.com");
        assert!(session.is_logged_in());
    }

    #[test]
    fn logout_clears_the_marker_but_keeps_the_profile() {
        let (store, session) = session();
        session.register("A", "a@x.com", "pw").expect("register");
        session.logout().expect("logout");

        assert!(!session.is_logged_in());
        assert_eq!(store.get(AUTH_MARKER_KEY).expect("marker"), None);
        assert!(store.get(USER_KEY).expect("user").is_some());
        assert!(session.current_user().is_some());
    }

    #[test]
    fn profile_update_merges_and_rehashes() {
        let (_store, session) = session();
        let before = session.register("A", "a@x.com", "pw").expect("register");

        let after = session
            .update_profile(ProfileUpdate {
                name: Some("Alice".to_string()),
                email: None,
                password: Some("new-pw".to_string()),
            })
            .expect("update");
        assert_eq!(after.name, "Alice");
        assert_eq!(after.email, "a@x.com");
        assert_ne!(after.password_hash, before.password_hash);

        session.logout().expect("logout");
        assert!(session.login("a@x.com", "new-pw").is_ok());
    }

    #[test]
    fn profile_update_without_a_user_is_not_found() {
        let (_store, session) = session();
        let err = session.update_profile(ProfileUpdate::default()).unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[test]
    fn preference_update_is_a_nested_merge() {
        let (_store, session) = session();
        session.register("A", "a@x.com", "pw").expect("register");
        session
            .update_preferences(PreferencesUpdate {
                theme: None,
                reminder_time: NaiveTime::from_hms_opt(7, 30, 0),
            })
            .expect("set reminder");

        let user = session
            .update_preferences(PreferencesUpdate {
                theme: Some(Theme::Dark),
                reminder_time: None,
            })
            .expect("set theme");
        assert_eq!(user.preferences.theme, Theme::Dark);
        assert_eq!(
            user.preferences.reminder_time,
            NaiveTime::from_hms_opt(7, 30, 0),
            "untouched preference keys survive the merge"
        );
    }

    #[test]
    fn wipe_removes_every_owned_key() {
        let (store, session) = session();
        session.register("A", "a@x.com", "pw").expect("register");
        store.set(HABITS_KEY, "[]").expect("seed habits");
        store.set(HABIT_LOGS_KEY, "[]").expect("seed logs");

        session.wipe_local_data().expect("wipe");
        for key in [USER_KEY, AUTH_MARKER_KEY, HABITS_KEY, HABIT_LOGS_KEY] {
            assert_eq!(store.get(key).expect("get"), None);
        }
        assert!(session.current_user().is_none());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn a_rebuilt_session_sees_persisted_state() {
        let (store, session) = session();
        session.register("A", "a@x.com", "pw").expect("register");
        drop(session);

        let revived = SessionStore::new(store);
        assert!(revived.is_logged_in());
        assert_eq!(revived.current_user().expect("user").email, "a@x.com");
    }
}
