//! Analytics - KPIs, grouped sums, time series and Pareto breakdowns.
//!
//! All aggregations are pure functions over a slice of registros so they can be
//! recomputed for any filter. [`dashboard`] loads the slice once and runs them all.

use crate::{
    core::{evento::EventKey, registro, session::Session},
    entities::registro::Model as RegistroModel,
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub use crate::core::registro::RegistroFilter;

/// Headline figures for a set of registros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    /// Sum of registro totals
    pub total: f64,
    /// Number of registros
    pub registros: usize,
    /// Number of distinct events
    pub eventos: usize,
    /// Sum of quantities
    pub unidades: i64,
    /// Revenue per event, zero without events
    pub ticket_promedio: f64,
    /// Number of distinct client companies
    pub clientes: usize,
    /// Venue with the most revenue
    pub top_salon: Option<String>,
    /// Client with the most revenue
    pub top_compania: Option<String>,
}

/// Axis to group revenue by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Venue
    Salon,
    /// Client company
    Compania,
    /// Line tipo
    Tipo,
    /// Calendar month, labelled `YYYY-MM`
    Mes,
}

/// Revenue of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    /// Group label
    pub label: String,
    /// Sum of totals
    pub total: f64,
    /// Number of registros
    pub count: usize,
    /// Fraction of overall revenue, 0 to 1
    pub share: f64,
}

/// Bucket size for [`time_series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One point per date
    Dia,
    /// One point per calendar month
    Mes,
}

/// One point of a revenue time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// First day of the bucket
    pub periodo: NaiveDate,
    /// Sum of totals in the bucket
    pub total: f64,
    /// Number of registros in the bucket
    pub count: usize,
}

/// One item of the Pareto subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    /// Item name
    pub item: String,
    /// Revenue of this item
    pub total: f64,
    /// Fraction of overall revenue
    pub share: f64,
    /// Fraction of overall revenue covered up to and including this item
    pub cumulative_share: f64,
}

/// Everything the dashboard shows for one filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Headline figures
    pub kpis: Kpis,
    /// Revenue per venue
    pub por_salon: Vec<GroupTotal>,
    /// Revenue per client
    pub por_compania: Vec<GroupTotal>,
    /// Revenue per tipo
    pub por_tipo: Vec<GroupTotal>,
    /// Revenue per month
    pub por_mes: Vec<GroupTotal>,
    /// Daily revenue
    pub serie_diaria: Vec<SeriesPoint>,
    /// Items covering the Pareto threshold of revenue
    pub pareto: Vec<ParetoEntry>,
}

fn month_start(fecha: NaiveDate) -> NaiveDate {
    fecha.with_day(1).unwrap_or(fecha)
}

fn label_for(registro: &RegistroModel, dimension: Dimension) -> String {
    match dimension {
        Dimension::Salon => registro.salon.clone(),
        Dimension::Compania => registro.compania.clone(),
        Dimension::Tipo => registro.tipo.label().to_string(),
        Dimension::Mes => registro.fecha.format("%Y-%m").to_string(),
    }
}

fn share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole }
}

fn top_by(registros: &[RegistroModel], dimension: Dimension) -> Option<String> {
    group_by(registros, dimension)
        .into_iter()
        .next()
        .map(|g| g.label)
}

/// Computes the headline figures.
#[must_use]
pub fn kpis(registros: &[RegistroModel]) -> Kpis {
    let total: f64 = registros.iter().map(|r| r.total).sum();
    let eventos = registros
        .iter()
        .map(EventKey::of)
        .collect::<HashSet<_>>()
        .len();
    let clientes = registros
        .iter()
        .map(|r| r.compania.as_str())
        .collect::<HashSet<_>>()
        .len();

    #[allow(clippy::cast_precision_loss)]
    let ticket_promedio = if eventos == 0 {
        0.0
    } else {
        total / eventos as f64
    };

    Kpis {
        total,
        registros: registros.len(),
        eventos,
        unidades: registros.iter().map(|r| i64::from(r.cantidad)).sum(),
        ticket_promedio,
        clientes,
        top_salon: top_by(registros, Dimension::Salon),
        top_compania: top_by(registros, Dimension::Compania),
    }
}

/// Sums revenue per group.
///
/// Months come out in calendar order for charting; every other dimension is
/// ordered by revenue, highest first, ties by label.
#[must_use]
pub fn group_by(registros: &[RegistroModel], dimension: Dimension) -> Vec<GroupTotal> {
    let overall: f64 = registros.iter().map(|r| r.total).sum();
    let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
    for registro in registros {
        let entry = groups.entry(label_for(registro, dimension)).or_insert((0.0, 0));
        entry.0 += registro.total;
        entry.1 += 1;
    }

    let mut totals: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(label, (total, count))| GroupTotal {
            label,
            total,
            count,
            share: share(total, overall),
        })
        .collect();

    if dimension == Dimension::Mes {
        totals.sort_by(|a, b| a.label.cmp(&b.label));
    } else {
        totals.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.label.cmp(&b.label))
        });
    }
    totals
}

/// Revenue per day or month, in date order. Empty buckets are not emitted.
#[must_use]
pub fn time_series(registros: &[RegistroModel], granularity: Granularity) -> Vec<SeriesPoint> {
    let mut buckets: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for registro in registros {
        let periodo = match granularity {
            Granularity::Dia => registro.fecha,
            Granularity::Mes => month_start(registro.fecha),
        };
        let entry = buckets.entry(periodo).or_insert((0.0, 0));
        entry.0 += registro.total;
        entry.1 += 1;
    }

    let mut points: Vec<SeriesPoint> = buckets
        .into_iter()
        .map(|(periodo, (total, count))| SeriesPoint {
            periodo,
            total,
            count,
        })
        .collect();
    points.sort_by_key(|p| p.periodo);
    points
}

/// Slack for float sums when comparing a cumulative share with a threshold.
const SHARE_EPSILON: f64 = 1e-9;

/// Items that together make up `threshold` of revenue.
///
/// Items are ranked by revenue, highest first, and taken until the cumulative
/// share reaches `threshold`; the item that crosses it is included. Items with
/// no revenue never appear.
#[must_use]
pub fn pareto(registros: &[RegistroModel], threshold: f64) -> Vec<ParetoEntry> {
    let mut items: HashMap<&str, f64> = HashMap::new();
    for registro in registros {
        *items.entry(registro.item.as_str()).or_insert(0.0) += registro.total;
    }
    let overall: f64 = items.values().sum();
    if overall <= 0.0 {
        return Vec::new();
    }

    let mut ranked: Vec<(&str, f64)> = items.into_iter().filter(|(_, t)| *t > 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let threshold = threshold.clamp(0.0, 1.0);
    let mut cumulative = 0.0;
    let mut entries = Vec::new();
    for (item, total) in ranked {
        if share(cumulative, overall) >= threshold - SHARE_EPSILON {
            break;
        }
        cumulative += total;
        entries.push(ParetoEntry {
            item: item.to_string(),
            total,
            share: share(total, overall),
            cumulative_share: share(cumulative, overall),
        });
    }
    entries
}

/// Builds every dashboard view from one pass over the store.
#[must_use]
pub fn build_dashboard(registros: &[RegistroModel], pareto_threshold: f64) -> Dashboard {
    Dashboard {
        kpis: kpis(registros),
        por_salon: group_by(registros, Dimension::Salon),
        por_compania: group_by(registros, Dimension::Compania),
        por_tipo: group_by(registros, Dimension::Tipo),
        por_mes: group_by(registros, Dimension::Mes),
        serie_diaria: time_series(registros, Granularity::Dia),
        pareto: pareto(registros, pareto_threshold),
    }
}

/// Loads the session user's registros matching `filter` and builds the dashboard.
pub async fn dashboard(
    db: &DatabaseConnection,
    session: &Session,
    filter: &RegistroFilter,
    pareto_threshold: f64,
) -> Result<Dashboard> {
    let registros = registro::list_registros(db, session, filter).await?;
    Ok(build_dashboard(&registros, pareto_threshold))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::TipoRegistro;
    use crate::test_utils::*;

    fn sample() -> Vec<RegistroModel> {
        vec![
            registro_model(1, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 50.0, 1),
            registro_model(2, "2024-01-10", "Azul", "Acme", TipoRegistro::Adicional, 10.0, 2),
            registro_model(3, "2024-02-05", "Rojo", "Globex", TipoRegistro::Venta, 20.0, 1),
            registro_model(4, "2024-03-01", "Azul", "Initech", TipoRegistro::SubArriendo, 5.0, 2),
        ]
    }

    #[test]
    fn test_kpis() {
        let k = kpis(&sample());
        assert_eq!(k.total, 100.0);
        assert_eq!(k.registros, 4);
        assert_eq!(k.eventos, 3);
        assert_eq!(k.unidades, 6);
        assert_eq!(k.clientes, 3);
        assert_eq!(k.top_salon.as_deref(), Some("Azul"));
        assert_eq!(k.top_compania.as_deref(), Some("Acme"));
        assert!((k.ticket_promedio - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpis_empty() {
        let k = kpis(&[]);
        assert_eq!(k.total, 0.0);
        assert_eq!(k.eventos, 0);
        assert_eq!(k.ticket_promedio, 0.0);
        assert!(k.top_salon.is_none());
    }

    #[test]
    fn test_group_by_salon_sorted_by_revenue() {
        let groups = group_by(&sample(), Dimension::Salon);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Azul");
        assert_eq!(groups[0].total, 80.0);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].share, 0.8);
        assert_eq!(groups[1].label, "Rojo");
    }

    #[test]
    fn test_group_by_tipo_uses_labels() {
        let groups = group_by(&sample(), Dimension::Tipo);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Venta", "Adicional", "SubArriendo"]);
    }

    #[test]
    fn test_group_by_month_in_calendar_order() {
        let groups = group_by(&sample(), Dimension::Mes);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["2024-01", "2024-02", "2024-03"]);
        assert_eq!(groups[0].total, 70.0);
    }

    #[test]
    fn test_time_series() {
        let daily = time_series(&sample(), Granularity::Dia);
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].periodo, date("2024-01-10"));
        assert_eq!(daily[0].count, 2);

        let monthly = time_series(&sample(), Granularity::Mes);
        assert_eq!(monthly[2].periodo, date("2024-03-01"));
        assert_eq!(monthly[2].total, 10.0);
    }

    #[test]
    fn test_pareto_includes_crossing_item() {
        let registros = vec![
            registro_model(1, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 50.0, 1),
            registro_model(2, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 25.0, 1),
            registro_model(3, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 15.0, 1),
            registro_model(4, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 10.0, 1),
        ];
        let mut named = registros;
        for (r, name) in named.iter_mut().zip(["Sillas", "Mesas", "Audio", "Luces"]) {
            r.item = name.to_string();
        }

        let entries = pareto(&named, 0.8);
        let items: Vec<&str> = entries.iter().map(|e| e.item.as_str()).collect();
        // 50 + 25 = 75% < 80%, so Audio crosses the line and is kept
        assert_eq!(items, ["Sillas", "Mesas", "Audio"]);
        assert_eq!(entries[2].cumulative_share, 0.9);
    }

    #[test]
    fn test_pareto_stops_exactly_at_threshold() {
        let mut registros = vec![
            registro_model(1, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 50.0, 1),
            registro_model(2, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 30.0, 1),
            registro_model(3, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 20.0, 1),
        ];
        for (r, name) in registros.iter_mut().zip(["A", "B", "C"]) {
            r.item = name.to_string();
        }
        let entries = pareto(&registros, 0.8);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].cumulative_share, 0.8);
    }

    #[test]
    fn test_pareto_threshold_tolerates_float_sums() {
        let mut registros = vec![
            registro_model(1, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 0.6, 1),
            registro_model(2, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 0.6, 1),
            registro_model(3, "2024-01-10", "Azul", "Acme", TipoRegistro::Venta, 0.3, 1),
        ];
        for (r, name) in registros.iter_mut().zip(["A", "B", "C"]) {
            r.item = name.to_string();
        }
        // 1.2 / 1.5 evaluates to 0.7999999999999999
        let entries = pareto(&registros, 0.8);
        let items: Vec<&str> = entries.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(items, ["A", "B"]);
    }

    #[test]
    fn test_pareto_merges_same_item() {
        let entries = pareto(&sample(), 1.0);
        // every sample registro has the same item name
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total, 100.0);
        assert!(pareto(&[], 0.8).is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_respects_filter() -> Result<()> {
        let (db, session) = setup_with_session().await?;
        registro::create_registro(
            &db,
            &session,
            sample_registro("2024-01-10", "Azul", "Acme", 100.0, 1),
        )
        .await?;
        registro::create_registro(
            &db,
            &session,
            sample_registro("2024-02-10", "Rojo", "Acme", 300.0, 1),
        )
        .await?;

        let filter = RegistroFilter {
            salon: Some("Rojo".to_string()),
            ..Default::default()
        };
        let board = dashboard(&db, &session, &filter, 0.8).await?;
        assert_eq!(board.kpis.total, 300.0);
        assert_eq!(board.por_salon.len(), 1);
        assert_eq!(board.por_mes[0].label, "2024-02");
        Ok(())
    }
}
