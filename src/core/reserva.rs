//! Reservation business logic - holding inventory for events.
//!
//! Stock is physical and shared, so availability is always computed against the
//! reservations of every user, while listing and editing are scoped to the
//! session user. Saves re-read the article and its reservations inside one store
//! transaction before checking availability.

use crate::{
    core::{evento::EventKey, session::Session},
    entities::{Articulo, Reserva, articulo, reserva},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// Units of `articulo` not held by any reservation other than `excluding`.
///
/// Reservations of other articles in `reservas` are ignored, so callers may pass
/// a mixed list. The result is negative when the article is over-reserved,
/// which can happen after its stock is lowered.
#[must_use]
pub fn available_stock(
    articulo: &articulo::Model,
    reservas: &[reserva::Model],
    excluding: Option<i64>,
) -> i64 {
    let held: i64 = reservas
        .iter()
        .filter(|r| r.articulo_id == articulo.id && Some(r.id) != excluding)
        .map(|r| i64::from(r.cantidad_reservada))
        .sum();
    i64::from(articulo.en_stock) - held
}

/// Checks that `requested` units of `articulo` can be held.
///
/// Returns the units that would remain free afterwards.
///
/// # Errors
/// - [`Error::InvalidQuantity`] if `requested` is not positive
/// - [`Error::InsufficientStock`] if `requested` exceeds [`available_stock`]
pub fn check_availability(
    articulo: &articulo::Model,
    reservas: &[reserva::Model],
    requested: i64,
    excluding: Option<i64>,
) -> Result<i64> {
    if requested <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: requested,
        });
    }
    let available = available_stock(articulo, reservas, excluding);
    if requested > available {
        return Err(Error::InsufficientStock {
            available: available.max(0),
            requested,
        });
    }
    Ok(available - requested)
}

async fn find_articulo<C>(db: &C, articulo_id: i64) -> Result<articulo::Model>
where
    C: ConnectionTrait,
{
    Articulo::find_by_id(articulo_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "articulo",
            key: articulo_id.to_string(),
        })
}

async fn reservas_of<C>(db: &C, articulo_id: i64) -> Result<Vec<reserva::Model>>
where
    C: ConnectionTrait,
{
    Reserva::find()
        .filter(reserva::Column::ArticuloId.eq(articulo_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reserves `cantidad` units of an articulo for the event `key`.
///
/// # Errors
/// Returns an error if the articulo does not exist, the quantity is not
/// positive, or it exceeds the free stock.
#[instrument(skip(db, session), fields(user_id = %session.user_id, key = %key))]
pub async fn create_reserva(
    db: &DatabaseConnection,
    session: &Session,
    articulo_id: i64,
    key: &EventKey,
    cantidad: i32,
) -> Result<reserva::Model> {
    if cantidad <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: i64::from(cantidad),
        });
    }

    let txn = db.begin().await?;

    let articulo = find_articulo(&txn, articulo_id).await?;
    let reservas = reservas_of(&txn, articulo_id).await?;
    let remaining = check_availability(&articulo, &reservas, i64::from(cantidad), None)?;

    let now = chrono::Utc::now().naive_utc();
    let model = reserva::ActiveModel {
        articulo_id: Set(articulo_id),
        evento_key: Set(key.to_string()),
        fecha: Set(key.fecha),
        cantidad_reservada: Set(cantidad),
        user_id: Set(session.user_id.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!(reserva_id = model.id, remaining, "Reserva created");
    Ok(model)
}

/// Changes the quantity of one of the session user's reservas.
///
/// The reservation's own current quantity does not count against availability.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn update_reserva_cantidad(
    db: &DatabaseConnection,
    session: &Session,
    reserva_id: i64,
    cantidad: i32,
) -> Result<reserva::Model> {
    if cantidad <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: i64::from(cantidad),
        });
    }

    let txn = db.begin().await?;

    let existing = Reserva::find_by_id(reserva_id)
        .filter(reserva::Column::UserId.eq(session.user_id.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "reserva",
            key: reserva_id.to_string(),
        })?;

    let articulo = find_articulo(&txn, existing.articulo_id).await?;
    let reservas = reservas_of(&txn, existing.articulo_id).await?;
    check_availability(&articulo, &reservas, i64::from(cantidad), Some(reserva_id))?;

    let mut active_model: reserva::ActiveModel = existing.into();
    active_model.cantidad_reservada = Set(cantidad);
    active_model.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = active_model.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes one of the session user's reservas, releasing its stock.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn delete_reserva(
    db: &DatabaseConnection,
    session: &Session,
    reserva_id: i64,
) -> Result<()> {
    let result = Reserva::delete_many()
        .filter(reserva::Column::Id.eq(reserva_id))
        .filter(reserva::Column::UserId.eq(session.user_id.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "reserva",
            key: reserva_id.to_string(),
        });
    }
    Ok(())
}

/// The session user's reservas for one event.
pub async fn get_reservas_for_event(
    db: &DatabaseConnection,
    session: &Session,
    key: &EventKey,
) -> Result<Vec<reserva::Model>> {
    Reserva::find()
        .filter(reserva::Column::EventoKey.eq(key.to_string()))
        .filter(reserva::Column::UserId.eq(session.user_id.as_str()))
        .order_by_asc(reserva::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every reserva held against an articulo, across all users.
pub async fn get_reservas_for_articulo(
    db: &DatabaseConnection,
    articulo_id: i64,
) -> Result<Vec<reserva::Model>> {
    Reserva::find()
        .filter(reserva::Column::ArticuloId.eq(articulo_id))
        .order_by_desc(reserva::Column::Fecha)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The session user's reservas with event dates in `[desde, hasta]`.
pub async fn list_reservas(
    db: &DatabaseConnection,
    session: &Session,
    desde: Option<NaiveDate>,
    hasta: Option<NaiveDate>,
) -> Result<Vec<reserva::Model>> {
    Reserva::find()
        .filter(reserva::Column::UserId.eq(session.user_id.as_str()))
        .filter(
            Condition::all()
                .add_option(desde.map(|d| reserva::Column::Fecha.gte(d)))
                .add_option(hasta.map(|h| reserva::Column::Fecha.lte(h))),
        )
        .order_by_desc(reserva::Column::Fecha)
        .order_by_asc(reserva::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One inventory line as seen from an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticuloDisponible {
    /// The inventory item
    pub articulo: articulo::Model,
    /// Units this event already holds
    pub reservado_evento: i64,
    /// Units still free for new reservations
    pub disponible: i64,
}

/// Every articulo with what the event holds and what is still free.
pub async fn availability_for_event(
    db: &DatabaseConnection,
    key: &EventKey,
) -> Result<Vec<ArticuloDisponible>> {
    let articulos = Articulo::find()
        .order_by_asc(articulo::Column::CodigoArticulo)
        .all(db)
        .await?;
    let reservas = Reserva::find().all(db).await?;
    let key_str = key.to_string();

    Ok(articulos
        .into_iter()
        .map(|articulo| {
            let reservado_evento = reservas
                .iter()
                .filter(|r| r.articulo_id == articulo.id && r.evento_key == key_str)
                .map(|r| i64::from(r.cantidad_reservada))
                .sum();
            let disponible = available_stock(&articulo, &reservas, None);
            ArticuloDisponible {
                articulo,
                reservado_evento,
                disponible,
            }
        })
        .collect())
}
