//! Session commands.

use crate::{cli::AppContext, core::session, errors::Result};

/// Opens a session for `user_id`.
pub async fn login(ctx: &AppContext, user_id: &str, email: Option<String>) -> Result<Vec<String>> {
    let session = session::sign_in(&ctx.db, user_id, email).await?;
    Ok(vec![format!("Sesión iniciada como {}", session.user_id)])
}

/// Closes the active session, if any.
pub async fn logout(ctx: &AppContext) -> Result<Vec<String>> {
    let message = if session::sign_out(&ctx.db).await? {
        "Sesión cerrada"
    } else {
        "No había una sesión activa"
    };
    Ok(vec![message.to_string()])
}

/// Describes the active session.
pub async fn whoami(ctx: &AppContext) -> Result<Vec<String>> {
    let Some(session) = session::current_session(&ctx.db).await? else {
        return Ok(vec!["Sin sesión activa".to_string()]);
    };
    let mut lines = vec![format!("Usuario: {}", session.user_id)];
    if let Some(email) = &session.email {
        lines.push(format!("Correo: {email}"));
    }
    lines.push(format!(
        "Desde: {} UTC",
        session.signed_in_at.format("%Y-%m-%d %H:%M")
    ));
    Ok(lines)
}
