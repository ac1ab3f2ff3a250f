//! Boundary to the external session/credential service.
//!
//! The dashboard only needs the capabilities in [`SessionProvider`].
//! [`InMemorySessions`] backs the scoring server's bearer tokens and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

const SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session not found or expired")]
    SessionExpired,
    #[error("{0}")]
    WeakPassword(String),
    #[error("{0}")]
    InvalidDisplayName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub password: Option<String>,
}

pub trait SessionProvider: Send + Sync {
    fn get_session(&self, token: &str) -> Option<Session>;
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn sign_out(&self, token: &str) -> Result<(), AuthError>;
    fn update_profile(&self, token: &str, update: ProfileUpdate) -> Result<UserProfile, AuthError>;
    fn reset_password(&self, email: &str) -> Result<(), AuthError>;
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let checks: [(bool, &str); 4] = [
        (
            password.chars().count() >= 8,
            "Password must be at least 8 characters",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Password must contain at least one uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Password must contain at least one lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Password must contain at least one number",
        ),
    ];

    match checks.iter().find(|(ok, _)| !ok) {
        Some((_, message)) => Err(AuthError::WeakPassword((*message).to_string())),
        None => Ok(()),
    }
}

pub fn validate_display_name(name: &str) -> Result<(), AuthError> {
    let length = name.trim().chars().count();
    if length < 2 {
        return Err(AuthError::InvalidDisplayName(
            "Display name must be at least 2 characters".to_string(),
        ));
    }
    if length >= 50 {
        return Err(AuthError::InvalidDisplayName(
            "Display name must be less than 50 characters".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug)]
struct Account {
    password: String,
    profile: UserProfile,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, Session>,
    reset_requests: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemorySessions {
    inner: Mutex<Inner>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        validate_password(password)?;
        let profile = UserProfile {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: default_display_name(email),
        };
        self.lock().accounts.insert(
            email.to_ascii_lowercase(),
            Account {
                password: password.to_string(),
                profile: profile.clone(),
            },
        );
        Ok(profile)
    }

    /// Installs a non-expiring session, used for service tokens.
    pub fn insert_token(&self, token: &str, email: &str) {
        let session = Session {
            token: token.to_string(),
            user: UserProfile {
                user_id: Uuid::new_v4(),
                email: email.to_string(),
                display_name: default_display_name(email),
            },
            expires_at: None,
        };
        self.lock().sessions.insert(token.to_string(), session);
    }

    pub fn reset_requests(&self) -> Vec<String> {
        self.lock().reset_requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionProvider for InMemorySessions {
    fn get_session(&self, token: &str) -> Option<Session> {
        let mut inner = self.lock();
        let session = inner.sessions.get(token)?.clone();
        match session.expires_at {
            Some(expires_at) if expires_at <= Utc::now() => {
                inner.sessions.remove(token);
                None
            }
            _ => Some(session),
        }
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get(&email.to_ascii_lowercase())
            .filter(|account| account.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let session = Session {
            token: Uuid::new_v4().to_string(),
            user: account.profile.clone(),
            expires_at: Some(Utc::now() + Duration::hours(SESSION_TTL_HOURS)),
        };
        inner.sessions.insert(session.token.clone(), session.clone());
        info!(user_id = %session.user.user_id, "signed in");
        Ok(session)
    }

    fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.lock()
            .sessions
            .remove(token)
            .map(|_| ())
            .ok_or(AuthError::SessionExpired)
    }

    fn update_profile(&self, token: &str, update: ProfileUpdate) -> Result<UserProfile, AuthError> {
        if let Some(name) = update.display_name.as_deref() {
            validate_display_name(name)?;
        }
        if let Some(password) = update.password.as_deref() {
            validate_password(password)?;
        }

        let session = self.get_session(token).ok_or(AuthError::SessionExpired)?;
        let mut inner = self.lock();
        let key = session.user.email.to_ascii_lowercase();
        let mut profile = session.user.clone();

        if let Some(name) = update.display_name {
            profile.display_name = name.trim().to_string();
        }
        if let Some(account) = inner.accounts.get_mut(&key) {
            account.profile = profile.clone();
            if let Some(password) = update.password {
                account.password = password;
            }
        }
        for stored in inner.sessions.values_mut() {
            if stored.user.user_id == profile.user_id {
                stored.user = profile.clone();
            }
        }
        Ok(profile)
    }

    fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        // Unknown addresses are accepted too so callers cannot probe accounts.
        self.lock().reset_requests.push(email.to_string());
        Ok(())
    }
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
