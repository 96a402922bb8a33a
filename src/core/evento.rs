//! Event aggregation - derived per-event views over flat registros.
//!
//! An event is never stored. It is the set of registros sharing the same
//! (`fecha`, `salon`, `compania`) triple, plus the reservas made against that
//! triple's key. [`group_events`] is a pure fold and can be re-run on any slice.

use crate::{
    core::{
        registro::{self, KEY_SEPARATOR, RegistroFilter},
        reserva,
        session::Session,
    },
    entities::{TipoRegistro, registro as registro_entity, reserva as reserva_entity},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

/// Composite identity of an event.
///
/// Ordering is by date, then venue, then client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventKey {
    /// Event date
    pub fecha: NaiveDate,
    /// Venue
    pub salon: String,
    /// Client company
    pub compania: String,
}

impl EventKey {
    /// Builds a key from its components, trimming the text parts.
    #[must_use]
    pub fn new(fecha: NaiveDate, salon: &str, compania: &str) -> Self {
        Self {
            fecha,
            salon: salon.trim().to_string(),
            compania: compania.trim().to_string(),
        }
    }

    /// Key of the event a registro belongs to.
    #[must_use]
    pub fn of(registro: &registro_entity::Model) -> Self {
        Self::new(registro.fecha, &registro.salon, &registro.compania)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.fecha.format("%Y-%m-%d"),
            self.salon,
            self.compania
        )
    }
}

impl FromStr for EventKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation {
            field: "evento_key",
            message: format!("expected YYYY-MM-DD{KEY_SEPARATOR}salon{KEY_SEPARATOR}compania, got '{s}'"),
        };

        let mut parts = s.split(KEY_SEPARATOR);
        let (Some(fecha), Some(salon), Some(compania), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let fecha = NaiveDate::parse_from_str(fecha.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
        let key = Self::new(fecha, salon, compania);
        if key.salon.is_empty() || key.compania.is_empty() {
            return Err(invalid());
        }
        Ok(key)
    }
}

/// Derived summary of one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evento {
    /// Identity of the event
    pub key: EventKey,
    /// Distinct BEO codes found on the event's registros
    pub beos: BTreeSet<String>,
    /// Billable lines, in input order
    pub items: Vec<registro_entity::Model>,
    /// Stock held for this event
    pub reservas: Vec<reserva_entity::Model>,
    /// Number of registros
    pub item_count: usize,
    /// Sum of `cantidad` over the registros
    pub unidades: i64,
    /// Sum of registro totals
    pub total: f64,
    /// Revenue per tipo
    pub total_por_tipo: BTreeMap<TipoRegistro, f64>,
}

impl Evento {
    fn empty(key: EventKey) -> Self {
        Self {
            key,
            beos: BTreeSet::new(),
            items: Vec::new(),
            reservas: Vec::new(),
            item_count: 0,
            unidades: 0,
            total: 0.0,
            total_por_tipo: BTreeMap::new(),
        }
    }

    fn push_item(&mut self, registro: registro_entity::Model) {
        if let Some(beo) = registro.beo.as_ref().filter(|b| !b.is_empty()) {
            self.beos.insert(beo.clone());
        }
        self.item_count += 1;
        self.unidades += i64::from(registro.cantidad);
        self.total += registro.total;
        *self.total_por_tipo.entry(registro.tipo).or_insert(0.0) += registro.total;
        self.items.push(registro);
    }

    /// Units reserved for this event across all articulos.
    #[must_use]
    pub fn unidades_reservadas(&self) -> i64 {
        self.reservas
            .iter()
            .map(|r| i64::from(r.cantidad_reservada))
            .sum()
    }
}

/// Folds registros and reservas into per-event summaries.
///
/// Reservas whose key is malformed are ignored; reservas whose key matches no
/// registro still produce an event with a zero total. Events come out newest
/// date first, ties ordered by venue then client.
#[must_use]
pub fn group_events(
    registros: &[registro_entity::Model],
    reservas: &[reserva_entity::Model],
) -> Vec<Evento> {
    let mut events: BTreeMap<EventKey, Evento> = BTreeMap::new();

    for registro in registros {
        let key = EventKey::of(registro);
        events
            .entry(key.clone())
            .or_insert_with(|| Evento::empty(key))
            .push_item(registro.clone());
    }

    for reserva in reservas {
        let Ok(key) = reserva.evento_key.parse::<EventKey>() else {
            tracing::warn!(
                reserva_id = reserva.id,
                key = %reserva.evento_key,
                "Skipping reserva with malformed event key"
            );
            continue;
        };
        events
            .entry(key.clone())
            .or_insert_with(|| Evento::empty(key))
            .reservas
            .push(reserva.clone());
    }

    let mut grouped: Vec<Evento> = events.into_values().collect();
    grouped.sort_by(|a, b| {
        b.key
            .fecha
            .cmp(&a.key.fecha)
            .then_with(|| a.key.salon.cmp(&b.key.salon))
            .then_with(|| a.key.compania.cmp(&b.key.compania))
    });
    grouped
}

/// Loads the session user's registros matching `filter` and the reservas in the
/// same date range, then groups them.
pub async fn load_events(
    db: &DatabaseConnection,
    session: &Session,
    filter: &RegistroFilter,
) -> Result<Vec<Evento>> {
    let registros = registro::list_registros(db, session, filter).await?;
    let reservas = reserva::list_reservas(db, session, filter.desde, filter.hasta).await?;

    let only_matching_registros = filter.salon.is_some()
        || filter.compania.is_some()
        || filter.tipo.is_some();
    let events = group_events(&registros, &reservas);
    if only_matching_registros {
        // reservation-only events have no registro to match against
        return Ok(events.into_iter().filter(|e| e.item_count > 0).collect());
    }
    Ok(events)
}

/// Loads a single event by key.
///
/// # Errors
/// Returns [`Error::NotFound`] if the key has neither registros nor reservas.
pub async fn find_event(
    db: &DatabaseConnection,
    session: &Session,
    key: &EventKey,
) -> Result<Evento> {
    let filter = RegistroFilter {
        desde: Some(key.fecha),
        hasta: Some(key.fecha),
        salon: Some(key.salon.clone()),
        compania: Some(key.compania.clone()),
        tipo: None,
    };
    let registros = registro::list_registros(db, session, &filter).await?;
    let reservas = reserva::get_reservas_for_event(db, session, key).await?;

    group_events(&registros, &reservas)
        .into_iter()
        .find(|e| &e.key == key)
        .ok_or_else(|| Error::NotFound {
            entity: "evento",
            key: key.to_string(),
        })
}
