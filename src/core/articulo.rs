//! Articulo business logic - the equipment inventory.
//!
//! Articulos are shared by all users. `codigo_articulo` is the business key:
//! it is unique, and bulk loads use it to decide between insert and update.

use crate::{
    entities::{Articulo, Reserva, articulo, reserva},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Input for a new or replaced articulo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticulo {
    /// Business code, unique
    pub codigo_articulo: String,
    /// Inventory group
    pub grupo: String,
    /// Inventory subgroup
    pub subgrupo: String,
    /// Description
    pub descripcion: String,
    /// Units on hand
    pub en_stock: i32,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    /// Codes that did not exist yet
    pub inserted: usize,
    /// Codes that were overwritten
    pub updated: usize,
}

/// Trims text fields and checks the code and stock.
///
/// # Errors
/// Returns an error if `codigo_articulo` or `descripcion` is blank, or
/// `en_stock` is negative.
pub fn validate_articulo(input: NewArticulo) -> Result<NewArticulo> {
    let codigo_articulo = input.codigo_articulo.trim().to_string();
    if codigo_articulo.is_empty() {
        return Err(Error::Validation {
            field: "codigo_articulo",
            message: "cannot be empty".to_string(),
        });
    }
    let descripcion = input.descripcion.trim().to_string();
    if descripcion.is_empty() {
        return Err(Error::Validation {
            field: "descripcion",
            message: "cannot be empty".to_string(),
        });
    }
    if input.en_stock < 0 {
        return Err(Error::InvalidQuantity {
            quantity: i64::from(input.en_stock),
        });
    }
    Ok(NewArticulo {
        codigo_articulo,
        grupo: input.grupo.trim().to_string(),
        subgrupo: input.subgrupo.trim().to_string(),
        descripcion,
        en_stock: input.en_stock,
    })
}

/// Lists articulos, optionally restricted to one group, ordered by group,
/// subgroup and code.
pub async fn list_articulos(
    db: &DatabaseConnection,
    grupo: Option<&str>,
) -> Result<Vec<articulo::Model>> {
    let mut query = Articulo::find();
    if let Some(grupo) = grupo {
        query = query.filter(articulo::Column::Grupo.eq(grupo));
    }
    query
        .order_by_asc(articulo::Column::Grupo)
        .order_by_asc(articulo::Column::Subgrupo)
        .order_by_asc(articulo::Column::CodigoArticulo)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an articulo by ID.
pub async fn get_articulo(
    db: &DatabaseConnection,
    articulo_id: i64,
) -> Result<Option<articulo::Model>> {
    Articulo::find_by_id(articulo_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_by_codigo<C>(db: &C, codigo: &str) -> Result<Option<articulo::Model>>
where
    C: ConnectionTrait,
{
    Articulo::find()
        .filter(articulo::Column::CodigoArticulo.eq(codigo.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an articulo by its business code.
pub async fn get_articulo_by_codigo(
    db: &DatabaseConnection,
    codigo: &str,
) -> Result<Option<articulo::Model>> {
    find_by_codigo(db, codigo).await
}

/// Creates an articulo.
///
/// # Errors
/// Returns an error if the input is invalid or the code is already taken.
#[instrument(skip(db))]
pub async fn create_articulo(
    db: &DatabaseConnection,
    input: NewArticulo,
) -> Result<articulo::Model> {
    let input = validate_articulo(input)?;
    if find_by_codigo(db, &input.codigo_articulo).await?.is_some() {
        return Err(Error::Validation {
            field: "codigo_articulo",
            message: format!("'{}' already exists", input.codigo_articulo),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    articulo::ActiveModel {
        codigo_articulo: Set(input.codigo_articulo),
        grupo: Set(input.grupo),
        subgrupo: Set(input.subgrupo),
        descripcion: Set(input.descripcion),
        en_stock: Set(input.en_stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

fn apply(mut model: articulo::ActiveModel, input: NewArticulo) -> articulo::ActiveModel {
    model.codigo_articulo = Set(input.codigo_articulo);
    model.grupo = Set(input.grupo);
    model.subgrupo = Set(input.subgrupo);
    model.descripcion = Set(input.descripcion);
    model.en_stock = Set(input.en_stock);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model
}

/// Replaces every field of an articulo.
///
/// Lowering `en_stock` below what is already reserved is allowed; affected
/// articulos then report negative availability until reservations are freed.
#[instrument(skip(db))]
pub async fn update_articulo(
    db: &DatabaseConnection,
    articulo_id: i64,
    input: NewArticulo,
) -> Result<articulo::Model> {
    let input = validate_articulo(input)?;

    let existing = get_articulo(db, articulo_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "articulo",
            key: articulo_id.to_string(),
        })?;

    let taken = find_by_codigo(db, &input.codigo_articulo)
        .await?
        .is_some_and(|other| other.id != articulo_id);
    if taken {
        return Err(Error::Validation {
            field: "codigo_articulo",
            message: format!("'{}' already exists", input.codigo_articulo),
        });
    }

    apply(existing.into(), input)
        .update(db)
        .await
        .map_err(Into::into)
}

/// Deletes an articulo together with its reservas.
#[instrument(skip(db))]
pub async fn delete_articulo(db: &DatabaseConnection, articulo_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let released = Reserva::delete_many()
        .filter(reserva::Column::ArticuloId.eq(articulo_id))
        .exec(&txn)
        .await?;
    let result = Articulo::delete_by_id(articulo_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "articulo",
            key: articulo_id.to_string(),
        });
    }

    txn.commit().await?;
    info!(
        articulo_id,
        reservas = released.rows_affected,
        "Articulo deleted"
    );
    Ok(())
}

/// Inserts or overwrites articulos by code, in one store transaction.
///
/// Every input is validated first; one bad input aborts the whole batch.
#[instrument(skip(db, inputs), fields(count = inputs.len()))]
pub async fn upsert_articulos(
    db: &DatabaseConnection,
    inputs: Vec<NewArticulo>,
) -> Result<UpsertCounts> {
    let inputs = inputs
        .into_iter()
        .map(validate_articulo)
        .collect::<Result<Vec<_>>>()?;

    let mut counts = UpsertCounts::default();
    let txn = db.begin().await?;

    for input in inputs {
        if let Some(existing) = find_by_codigo(&txn, &input.codigo_articulo).await? {
            apply(existing.into(), input).update(&txn).await?;
            counts.updated += 1;
        } else {
            let now = chrono::Utc::now().naive_utc();
            articulo::ActiveModel {
                codigo_articulo: Set(input.codigo_articulo),
                grupo: Set(input.grupo),
                subgrupo: Set(input.subgrupo),
                descripcion: Set(input.descripcion),
                en_stock: Set(input.en_stock),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            counts.inserted += 1;
        }
    }

    txn.commit().await?;
    info!(
        inserted = counts.inserted,
        updated = counts.updated,
        "Articulos upserted"
    );
    Ok(counts)
}
