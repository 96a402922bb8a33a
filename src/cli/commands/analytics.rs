//! Dashboard and Pareto commands.

use crate::{
    cli::AppContext,
    core::{
        analytics::{self, GroupTotal, RegistroFilter},
        registro,
        report::{format_group_lines, format_kpis, format_pareto_lines, format_percent},
        session,
    },
    errors::{Error, Result},
};

fn section(lines: &mut Vec<String>, title: &str, groups: &[GroupTotal]) {
    if groups.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{title}:"));
    lines.extend(format_group_lines(groups).into_iter().map(|l| format!("  {l}")));
}

/// KPIs plus revenue per venue, client, tipo and month.
pub async fn dashboard(ctx: &AppContext, filter: RegistroFilter) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let board = analytics::dashboard(
        &ctx.db,
        &session,
        &filter,
        ctx.settings.analytics.pareto_threshold,
    )
    .await?;

    let mut lines = format_kpis(&board.kpis);
    section(&mut lines, "Por salón", &board.por_salon);
    section(&mut lines, "Por compañía", &board.por_compania);
    section(&mut lines, "Por tipo", &board.por_tipo);
    section(&mut lines, "Por mes", &board.por_mes);
    Ok(lines)
}

/// Items covering `umbral` of revenue, or the configured threshold.
///
/// # Errors
/// Returns [`Error::Validation`] if the threshold is not in (0, 1].
pub async fn pareto(
    ctx: &AppContext,
    filter: RegistroFilter,
    umbral: Option<f64>,
) -> Result<Vec<String>> {
    let threshold = umbral.unwrap_or(ctx.settings.analytics.pareto_threshold);
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(Error::Validation {
            field: "umbral",
            message: format!("must be in (0, 1], got {threshold}"),
        });
    }

    let session = session::require_session(&ctx.db).await?;
    let registros = registro::list_registros(&ctx.db, &session, &filter).await?;
    let entries = analytics::pareto(&registros, threshold);
    if entries.is_empty() {
        return Ok(vec!["Sin ingresos en el periodo".to_string()]);
    }

    let mut lines = vec![format!(
        "{} ítems suman el {} de los ingresos:",
        entries.len(),
        format_percent(entries.last().map_or(0.0, |e| e.cumulative_share))
    )];
    lines.extend(format_pareto_lines(&entries));
    Ok(lines)
}
