//! Evento commands.

use crate::{
    cli::{AppContext, commands::registro::format_registro_line},
    core::{
        evento::{self, EventKey},
        registro::RegistroFilter,
        report::{format_clp, format_evento_summary},
        reserva, session,
    },
    errors::Result,
};
use std::collections::HashMap;

/// Lists the session user's events.
pub async fn list(ctx: &AppContext, filter: RegistroFilter) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let eventos = evento::load_events(&ctx.db, &session, &filter).await?;
    if eventos.is_empty() {
        return Ok(vec!["Sin eventos".to_string()]);
    }

    let total: f64 = eventos.iter().map(|e| e.total).sum();
    let mut lines: Vec<String> = eventos.iter().map(format_evento_summary).collect();
    lines.push(format!(
        "{} eventos, total {}",
        eventos.len(),
        format_clp(total)
    ));
    Ok(lines)
}

/// Shows one event: lines, revenue per tipo, reservations and stock.
pub async fn show(ctx: &AppContext, key: &str) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let key: EventKey = key.parse()?;
    let evento = evento::find_event(&ctx.db, &session, &key).await?;
    let stock = reserva::availability_for_event(&ctx.db, &key).await?;

    let mut lines = vec![format_evento_summary(&evento)];

    if !evento.items.is_empty() {
        lines.push(String::new());
        lines.push("Ítems:".to_string());
        lines.extend(evento.items.iter().map(|r| format!("  {}", format_registro_line(r))));
        lines.push("Total por tipo:".to_string());
        lines.extend(
            evento
                .total_por_tipo
                .iter()
                .map(|(tipo, total)| format!("  {tipo}: {}", format_clp(*total))),
        );
    }

    if !evento.reservas.is_empty() {
        let codigos: HashMap<i64, &str> = stock
            .iter()
            .map(|s| (s.articulo.id, s.articulo.codigo_articulo.as_str()))
            .collect();
        lines.push(String::new());
        lines.push(format!(
            "Reservas ({} unidades):",
            evento.unidades_reservadas()
        ));
        for r in &evento.reservas {
            lines.push(format!(
                "  #{} {} x {}",
                r.id,
                codigos.get(&r.articulo_id).copied().unwrap_or("?"),
                r.cantidad_reservada
            ));
        }
    }

    let held: Vec<_> = stock.iter().filter(|s| s.reservado_evento > 0).collect();
    if !held.is_empty() {
        lines.push(String::new());
        lines.push("Stock:".to_string());
        for s in held {
            lines.push(format!(
                "  {} {}: reservado {}, disponible {}",
                s.articulo.codigo_articulo,
                s.articulo.descripcion,
                s.reservado_evento,
                s.disponible.max(0)
            ));
        }
    }
    Ok(lines)
}
