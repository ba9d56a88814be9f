//! # Session Commands
//!
//! Log in and out of the register. The session decides which store every
//! gateway call is scoped to.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{store_scope, LocalStore, Session, DEMO_USER_ID};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub logged_in: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Store the register works against.
    pub store_id: String,
    pub is_demo: bool,
    pub active_shift_id: Option<String>,
}

impl SessionResponse {
    fn from_store(local: &LocalStore) -> Self {
        let session = local.session();
        SessionResponse {
            logged_in: session.is_some(),
            store_id: store_scope(session.as_ref()),
            is_demo: session.as_ref().map_or(false, Session::is_demo),
            user_id: session.as_ref().map(|s| s.user_id.clone()),
            email: session.as_ref().map(|s| s.email.clone()),
            role: session.map(|s| s.role),
            active_shift_id: local.active_shift_id(),
        }
    }
}

/// Starts a session. `demo` logs in as the built-in demo user.
pub fn login(
    local: &LocalStore,
    email: &str,
    store_id: Option<&str>,
    role: &str,
    demo: bool,
) -> Result<SessionResponse, ApiError> {
    debug!(email, demo, "login command");

    let email = email.trim();
    if !demo && !email.contains('@') {
        return Err(ApiError::validation(format!(
            "'{}' is not an e-mail address",
            email
        )));
    }

    if local.session().is_some() {
        return Err(ApiError::session("Already logged in; log out first"));
    }

    let session = Session {
        user_id: if demo {
            DEMO_USER_ID.to_string()
        } else {
            Uuid::new_v4().to_string()
        },
        email: email.to_string(),
        role: role.trim().to_lowercase(),
        store_id: store_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        token: Uuid::new_v4().to_string(),
    };

    local.save_session(&session)?;
    info!(user_id = %session.user_id, store_id = %store_scope(Some(&session)), "Logged in");

    Ok(SessionResponse::from_store(local))
}

/// Ends the session and forgets the active shift slot.
pub fn logout(local: &LocalStore) -> Result<SessionResponse, ApiError> {
    debug!("logout command");
    local.clear_session()?;
    info!("Logged out");
    Ok(SessionResponse::from_store(local))
}

pub fn current_session(local: &LocalStore) -> SessionResponse {
    SessionResponse::from_store(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use posgo_core::DEMO_TEMPLATE_ID;

    fn local(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn test_login_scopes_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let local = local(&dir);

        let session = login(&local, "ana@bodega.pe", Some("store-9"), "Cashier", false).unwrap();
        assert!(session.logged_in);
        assert!(!session.is_demo);
        assert_eq!(session.store_id, "store-9");
        assert_eq!(session.role.as_deref(), Some("cashier"));
    }

    #[test]
    fn test_demo_login_uses_template_store() {
        let dir = tempfile::tempdir().unwrap();
        let local = local(&dir);

        let session = login(&local, "", Some("store-9"), "admin", true).unwrap();
        assert!(session.is_demo);
        assert_eq!(session.store_id, DEMO_TEMPLATE_ID);
    }

    #[test]
    fn test_second_login_refused() {
        let dir = tempfile::tempdir().unwrap();
        let local = local(&dir);
        login(&local, "ana@bodega.pe", None, "cashier", false).unwrap();

        let err = login(&local, "luis@bodega.pe", None, "cashier", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionError);
    }

    #[test]
    fn test_logout_forgets_active_shift() {
        let dir = tempfile::tempdir().unwrap();
        let local = local(&dir);
        login(&local, "ana@bodega.pe", Some("store-9"), "cashier", false).unwrap();
        local.set_active_shift_id(Some("shift-1")).unwrap();

        let session = logout(&local).unwrap();
        assert!(!session.logged_in);
        assert!(session.active_shift_id.is_none());
        assert_eq!(session.store_id, DEMO_TEMPLATE_ID);
    }

    #[test]
    fn test_bad_email() {
        let dir = tempfile::tempdir().unwrap();
        let err = login(&local(&dir), "ana", None, "cashier", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
