//! # Local Session Store
//!
//! Synchronous key-value persistence on the register itself: who is logged
//! in and which shift this terminal last opened. Both live in one small JSON
//! file next to the database.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ session.json                                 │
//! │ {                                            │
//! │   "session": { "userId", "email", "role",    │
//! │                "storeId", "token" },         │
//! │   "activeShiftId": "7f3a…"                   │
//! │ }                                            │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Reads never suspend; a missing or unreadable file is an empty store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use posgo_core::DEMO_TEMPLATE_ID;

/// User id of the built-in demo account.
pub const DEMO_USER_ID: &str = "test-user-demo";

/// E-mail domain reserved for demo accounts.
pub const DEMO_EMAIL_DOMAIN: &str = "@demo.posgo";

/// Errors writing the local store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("session encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub token: String,
}

impl Session {
    /// Demo users are routed to the shared template store.
    pub fn is_demo(&self) -> bool {
        self.user_id == DEMO_USER_ID || self.email.ends_with(DEMO_EMAIL_DOMAIN)
    }
}

/// Store id every gateway call is scoped to.
///
/// No session and demo sessions use the demo template store; otherwise the
/// session's store, falling back to the template when it has none.
pub fn store_scope(session: Option<&Session>) -> String {
    match session {
        Some(session) if !session.is_demo() => session
            .store_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(DEMO_TEMPLATE_ID)
            .to_string(),
        _ => DEMO_TEMPLATE_ID.to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalData {
    #[serde(default)]
    session: Option<Session>,
    #[serde(default)]
    active_shift_id: Option<String>,
}

/// File-backed session and active-shift slot.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current session, if logged in.
    pub fn session(&self) -> Option<Session> {
        self.read().session
    }

    /// Store id for the current session (see [`store_scope`]).
    pub fn store_scope(&self) -> String {
        store_scope(self.session().as_ref())
    }

    pub fn save_session(&self, session: &Session) -> Result<(), SessionError> {
        let mut data = self.read();
        data.session = Some(session.clone());
        self.write(&data)
    }

    /// Logs out. The active shift slot is cleared with the session.
    pub fn clear_session(&self) -> Result<(), SessionError> {
        self.write(&LocalData::default())
    }

    pub fn active_shift_id(&self) -> Option<String> {
        self.read().active_shift_id
    }

    /// Sets or clears the active shift slot.
    pub fn set_active_shift_id(&self, shift_id: Option<&str>) -> Result<(), SessionError> {
        let mut data = self.read();
        if data.active_shift_id.as_deref() == shift_id {
            return Ok(());
        }
        data.active_shift_id = shift_id.map(str::to_string);
        self.write(&data)
    }

    fn read(&self) -> LocalData {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LocalData::default(),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Session file unreadable");
                return LocalData::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = ?self.path, error = %e, "Session file corrupt, ignoring");
            LocalData::default()
        })
    }

    fn write(&self, data: &LocalData) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(data)?).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = ?self.path, "Session file written");
        Ok(())
    }
}
