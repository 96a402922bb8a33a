//! Text formatting for derived views.
//!
//! These helpers turn analytics and event data into display strings. They hold
//! no state and never touch the store, so any front end can reuse them.

use crate::core::{
    analytics::{GroupTotal, Kpis, ParetoEntry},
    evento::Evento,
};

/// Formats an amount as Chilean pesos: no decimals, `.` as thousands separator.
///
/// `1234567.4` becomes `$1.234.567`; negatives become `-$500`.
#[must_use]
pub fn format_clp(amount: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Formats a 0-1 share as a percentage with one decimal and a decimal comma.
#[must_use]
pub fn format_percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0).replace('.', ",")
}

/// Text bar for a 0-1 share, like `[████░░░░░░]`.
///
/// Values outside 0-1 are clamped.
#[must_use]
pub fn format_share_bar(share: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = share.clamp(0.0, 1.0);

    // clamped is in [0, 1] and length is small, so the product fits in usize
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (clamped * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// One line per group: label, amount, bar and share.
#[must_use]
pub fn format_group_lines(groups: &[GroupTotal]) -> Vec<String> {
    let width = groups.iter().map(|g| g.label.chars().count()).max().unwrap_or(0);
    groups
        .iter()
        .map(|g| {
            format!(
                "{:<width$}  {:>14}  {} {}",
                g.label,
                format_clp(g.total),
                format_share_bar(g.share, None),
                format_percent(g.share),
            )
        })
        .collect()
}

/// Headline figures as `label: value` lines.
#[must_use]
pub fn format_kpis(kpis: &Kpis) -> Vec<String> {
    vec![
        format!("Ingresos totales: {}", format_clp(kpis.total)),
        format!("Registros: {}", kpis.registros),
        format!("Eventos: {}", kpis.eventos),
        format!("Unidades: {}", kpis.unidades),
        format!("Ticket promedio por evento: {}", format_clp(kpis.ticket_promedio)),
        format!("Clientes: {}", kpis.clientes),
        format!(
            "Salón principal: {}",
            kpis.top_salon.as_deref().unwrap_or("-")
        ),
        format!(
            "Cliente principal: {}",
            kpis.top_compania.as_deref().unwrap_or("-")
        ),
    ]
}

/// Ranked Pareto lines with individual and cumulative share.
#[must_use]
pub fn format_pareto_lines(entries: &[ParetoEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "{:>3}. {}  {}  {}  (acumulado {})",
                i + 1,
                e.item,
                format_clp(e.total),
                format_percent(e.share),
                format_percent(e.cumulative_share),
            )
        })
        .collect()
}

/// Single-line summary of an event.
///
/// Format: `2024-03-15 | Salón Azul | Acme | 3 ítems | $150.000`
#[must_use]
pub fn format_evento_summary(evento: &Evento) -> String {
    let mut line = format!(
        "{} | {} | {} | {} ítems | {}",
        evento.key.fecha.format("%Y-%m-%d"),
        evento.key.salon,
        evento.key.compania,
        evento.item_count,
        format_clp(evento.total),
    );
    if !evento.beos.is_empty() {
        let beos: Vec<&str> = evento.beos.iter().map(String::as_str).collect();
        line.push_str(&format!(" | BEO {}", beos.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{analytics, evento::group_events},
        entities::TipoRegistro,
        test_utils::*,
    };

    #[test]
    fn test_format_clp() {
        assert_eq!(format_clp(0.0), "$0");
        assert_eq!(format_clp(950.0), "$950");
        assert_eq!(format_clp(1000.0), "$1.000");
        assert_eq!(format_clp(1_234_567.4), "$1.234.567");
        assert_eq!(format_clp(-15_000.0), "-$15.000");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.8), "80,0%");
        assert_eq!(format_percent(0.0), "0,0%");
        assert_eq!(format_percent(1.0), "100,0%");
    }

    #[test]
    fn test_format_share_bar() {
        assert_eq!(format_share_bar(1.0, Some(10)), "[██████████]");
        assert_eq!(format_share_bar(0.5, Some(10)), "[█████░░░░░]");
        assert_eq!(format_share_bar(0.0, Some(4)), "[░░░░]");
        // out of range is clamped
        assert_eq!(format_share_bar(1.7, Some(4)), "[████]");
        assert_eq!(format_share_bar(-0.2, Some(4)), "[░░░░]");
    }

    #[test]
    fn test_format_group_lines_aligns_labels() {
        let registros = vec![
            registro_model(1, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 750.0, 1),
            registro_model(2, "2024-01-10", "Gran Salón", "Acme", TipoRegistro::Venta, 250.0, 1),
        ];
        let lines = format_group_lines(&analytics::group_by(
            &registros,
            analytics::Dimension::Salon,
        ));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Azul        "));
        assert!(lines[0].ends_with("75,0%"));
        assert!(lines[1].contains("$250"));
    }

    #[test]
    fn test_format_kpis_without_data() {
        let lines = format_kpis(&analytics::kpis(&[]));
        assert_eq!(lines[0], "Ingresos totales: $0");
        assert_eq!(lines[6], "Salón principal: -");
    }

    #[test]
    fn test_format_evento_summary() {
        let mut registro =
            registro_model(1, "2024-03-15", "Salón Azul", "Acme", TipoRegistro::Venta, 50_000.0, 3);
        registro.beo = Some("B-12".to_string());
        let eventos = group_events(&[registro], &[]);

        assert_eq!(
            format_evento_summary(&eventos[0]),
            "2024-03-15 | Salón Azul | Acme | 1 ítems | $150.000 | BEO B-12"
        );
    }
}
