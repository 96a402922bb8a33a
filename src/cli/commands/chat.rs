//! Chat command.

use crate::{
    cli::AppContext,
    core::{
        assistant::{self, TextGenerator},
        session,
    },
    errors::Result,
};

/// Asks the assistant one question about the session user's data.
pub async fn chat(
    ctx: &AppContext,
    generator: &dyn TextGenerator,
    pregunta: &str,
) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let answer = assistant::ask(&ctx.db, &session, generator, pregunta).await?;
    Ok(answer.lines().map(str::to_string).collect())
}
