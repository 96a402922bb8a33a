//! Session business logic - who is using the ledger.
//!
//! Authentication itself is delegated to an external provider; this module only
//! keeps the resulting identity. The active session is stored as a JSON document
//! in the `system_state` table under [`ACTIVE_SESSION_KEY`].

use crate::{
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// `system_state` key holding the active session.
pub const ACTIVE_SESSION_KEY: &str = "active_session";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identity issued by the authentication provider; owns every registro
    pub user_id: String,
    /// Contact address, if the provider supplied one
    pub email: Option<String>,
    /// When the session was opened
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session for `user_id` opened now.
    #[must_use]
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            signed_in_at: Utc::now(),
        }
    }
}

/// Opens a session for `user_id`, replacing any previous one.
///
/// # Errors
/// Returns an error if `user_id` is blank or the store write fails.
#[instrument(skip(db))]
pub async fn sign_in(
    db: &DatabaseConnection,
    user_id: &str,
    email: Option<String>,
) -> Result<Session> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::Validation {
            field: "user_id",
            message: "cannot be empty".to_string(),
        });
    }

    let session = Session::new(user_id, email);
    let value = serde_json::to_value(&session)?;

    let entry = system_state::ActiveModel {
        key: Set(ACTIVE_SESSION_KEY.to_string()),
        value: Set(value),
        updated_at: Set(Utc::now().naive_utc()),
    };
    SystemState::insert(entry)
        .on_conflict(
            OnConflict::column(system_state::Column::Key)
                .update_columns([system_state::Column::Value, system_state::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!(user_id = %session.user_id, "Signed in");
    Ok(session)
}

/// Returns the active session, if any.
pub async fn current_session(db: &DatabaseConnection) -> Result<Option<Session>> {
    let Some(entry) = SystemState::find_by_id(ACTIVE_SESSION_KEY).one(db).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_value(entry.value)?))
}

/// Returns the active session or [`Error::NotSignedIn`].
pub async fn require_session(db: &DatabaseConnection) -> Result<Session> {
    current_session(db).await?.ok_or(Error::NotSignedIn)
}

/// Closes the active session. Returns whether there was one.
#[instrument(skip(db))]
pub async fn sign_out(db: &DatabaseConnection) -> Result<bool> {
    let result = SystemState::delete_by_id(ACTIVE_SESSION_KEY).exec(db).await?;
    let closed = result.rows_affected > 0;
    if closed {
        info!("Signed out");
    }
    Ok(closed)
}
