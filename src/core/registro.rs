//! Registro business logic - billable line items.
//!
//! Creates, lists, updates and deletes registros for the signed-in user. Every
//! write goes through [`validate_registro`], which trims text fields and rejects
//! non-positive amounts, and the stored `total` is always recomputed with
//! [`compute_total`]. Nothing here trusts a total supplied by the caller.

use crate::{
    core::session::Session,
    entities::{Registro, TipoRegistro, registro},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Character separating the components of an event key. Forbidden in `salon`
/// and `compania` so that keys stay unambiguous.
pub const KEY_SEPARATOR: char = '|';

/// Input for a new or replaced registro. `total` is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRegistro {
    /// Event date
    pub fecha: NaiveDate,
    /// Optional BEO code
    pub beo: Option<String>,
    /// Venue
    pub salon: String,
    /// Client company
    pub compania: String,
    /// Billed item
    pub item: String,
    /// Kind of line
    pub tipo: TipoRegistro,
    /// Unit price
    pub valor: f64,
    /// Units billed
    pub cantidad: i32,
}

impl NewRegistro {
    /// Line total for this input.
    #[must_use]
    pub fn total(&self) -> f64 {
        compute_total(self.valor, self.cantidad)
    }
}

/// Optional constraints on which registros to read.
///
/// Used as a store query by [`list_registros`] and in memory by
/// [`RegistroFilter::matches`]; both give the same answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistroFilter {
    /// First date included
    pub desde: Option<NaiveDate>,
    /// Last date included
    pub hasta: Option<NaiveDate>,
    /// Exact venue
    pub salon: Option<String>,
    /// Exact client company
    pub compania: Option<String>,
    /// Exact tipo
    pub tipo: Option<TipoRegistro>,
}

impl RegistroFilter {
    /// Whether `registro` passes every set constraint.
    #[must_use]
    pub fn matches(&self, registro: &registro::Model) -> bool {
        self.desde.is_none_or(|d| registro.fecha >= d)
            && self.hasta.is_none_or(|h| registro.fecha <= h)
            && self.salon.as_ref().is_none_or(|s| &registro.salon == s)
            && self.compania.as_ref().is_none_or(|c| &registro.compania == c)
            && self.tipo.is_none_or(|t| registro.tipo == t)
    }

    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(self.desde.map(|d| registro::Column::Fecha.gte(d)))
            .add_option(self.hasta.map(|h| registro::Column::Fecha.lte(h)))
            .add_option(self.salon.clone().map(|s| registro::Column::Salon.eq(s)))
            .add_option(
                self.compania
                    .clone()
                    .map(|c| registro::Column::Compania.eq(c)),
            )
            .add_option(self.tipo.map(|t| registro::Column::Tipo.eq(t)))
    }
}

/// `valor * cantidad`.
#[must_use]
pub fn compute_total(valor: f64, cantidad: i32) -> f64 {
    valor * f64::from(cantidad)
}

fn required_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            field,
            message: "cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn key_component(field: &'static str, value: &str) -> Result<String> {
    let trimmed = required_text(field, value)?;
    if trimmed.contains(KEY_SEPARATOR) {
        return Err(Error::Validation {
            field,
            message: format!("cannot contain '{KEY_SEPARATOR}'"),
        });
    }
    Ok(trimmed)
}

/// Checks and normalizes a registro input.
///
/// Text fields are trimmed and a blank BEO becomes `None`.
///
/// # Errors
/// Returns an error if:
/// - `salon`, `compania` or `item` is blank
/// - `salon` or `compania` contains [`KEY_SEPARATOR`]
/// - `valor` is not a finite positive number
/// - `cantidad` is not positive
pub fn validate_registro(input: NewRegistro) -> Result<NewRegistro> {
    if !input.valor.is_finite() || input.valor <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.valor,
        });
    }
    if input.cantidad <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: i64::from(input.cantidad),
        });
    }

    Ok(NewRegistro {
        salon: key_component("salon", &input.salon)?,
        compania: key_component("compania", &input.compania)?,
        item: required_text("item", &input.item)?,
        beo: input
            .beo
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty()),
        ..input
    })
}

fn active_model(user_id: &str, input: NewRegistro) -> registro::ActiveModel {
    let now = chrono::Utc::now().naive_utc();
    let total = input.total();
    registro::ActiveModel {
        user_id: Set(user_id.to_string()),
        fecha: Set(input.fecha),
        beo: Set(input.beo),
        salon: Set(input.salon),
        compania: Set(input.compania),
        item: Set(input.item),
        tipo: Set(input.tipo),
        valor: Set(input.valor),
        cantidad: Set(input.cantidad),
        total: Set(total),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

/// Creates a registro owned by the session user.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn create_registro(
    db: &DatabaseConnection,
    session: &Session,
    input: NewRegistro,
) -> Result<registro::Model> {
    let input = validate_registro(input)?;
    let model = active_model(&session.user_id, input).insert(db).await?;
    debug!(id = model.id, total = model.total, "Registro created");
    Ok(model)
}

/// Rows per `INSERT` statement. Keeps each statement well under `SQLite`'s
/// bound-parameter limit.
const INSERT_CHUNK_ROWS: usize = 500;

/// Inserts a batch of registros in one store transaction.
///
/// Every input is validated before anything is written; one bad input aborts the
/// whole batch. Large batches are written in several statements inside the same
/// transaction. Returns the number of rows inserted.
#[instrument(skip(db, session, inputs), fields(user_id = %session.user_id, count = inputs.len()))]
pub async fn create_registros(
    db: &DatabaseConnection,
    session: &Session,
    inputs: Vec<NewRegistro>,
) -> Result<usize> {
    let models = inputs
        .into_iter()
        .map(|input| validate_registro(input).map(|v| active_model(&session.user_id, v)))
        .collect::<Result<Vec<_>>>()?;
    let count = models.len();
    if count == 0 {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let chunk: Vec<_> = models.by_ref().take(INSERT_CHUNK_ROWS).collect();
        Registro::insert_many(chunk).exec(&txn).await?;
    }
    txn.commit().await?;

    info!(count, "Registros inserted");
    Ok(count)
}

/// Finds one of the session user's registros by ID.
pub async fn get_registro(
    db: &DatabaseConnection,
    session: &Session,
    registro_id: i64,
) -> Result<Option<registro::Model>> {
    Registro::find_by_id(registro_id)
        .filter(registro::Column::UserId.eq(session.user_id.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the session user's registros matching `filter`, newest date first.
pub async fn list_registros(
    db: &DatabaseConnection,
    session: &Session,
    filter: &RegistroFilter,
) -> Result<Vec<registro::Model>> {
    Registro::find()
        .filter(registro::Column::UserId.eq(session.user_id.as_str()))
        .filter(filter.condition())
        .order_by_desc(registro::Column::Fecha)
        .order_by_desc(registro::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replaces every editable field of a registro and recomputes its total.
///
/// # Errors
/// Returns an error if the input is invalid, the registro does not exist or
/// belongs to another user, or the store update fails.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn update_registro(
    db: &DatabaseConnection,
    session: &Session,
    registro_id: i64,
    input: NewRegistro,
) -> Result<registro::Model> {
    let input = validate_registro(input)?;

    let mut registro: registro::ActiveModel = get_registro(db, session, registro_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "registro",
            key: registro_id.to_string(),
        })?
        .into();

    registro.total = Set(input.total());
    registro.fecha = Set(input.fecha);
    registro.beo = Set(input.beo);
    registro.salon = Set(input.salon);
    registro.compania = Set(input.compania);
    registro.item = Set(input.item);
    registro.tipo = Set(input.tipo);
    registro.valor = Set(input.valor);
    registro.cantidad = Set(input.cantidad);
    registro.updated_at = Set(chrono::Utc::now().naive_utc());

    registro.update(db).await.map_err(Into::into)
}

/// Deletes one of the session user's registros.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn delete_registro(
    db: &DatabaseConnection,
    session: &Session,
    registro_id: i64,
) -> Result<()> {
    let result = Registro::delete_many()
        .filter(registro::Column::Id.eq(registro_id))
        .filter(registro::Column::UserId.eq(session.user_id.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "registro",
            key: registro_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(15_000.0, 3), 45_000.0);
        assert_eq!(compute_total(12.5, 2), 25.0);
    }

    #[test]
    fn test_validate_trims_and_drops_blank_beo() {
        let mut input = sample_registro("2024-03-15", "Salón Azul", "Acme", 100.0, 2);
        input.salon = "  Salón Azul ".to_string();
        input.beo = Some("   ".to_string());

        let validated = validate_registro(input).unwrap();
        assert_eq!(validated.salon, "Salón Azul");
        assert!(validated.beo.is_none());
    }

    #[test]
    fn test_validate_rejects_separator_in_key_fields() {
        let input = sample_registro("2024-03-15", "Salón|Azul", "Acme", 100.0, 2);
        assert!(matches!(
            validate_registro(input),
            Err(Error::Validation { field: "salon", .. })
        ));
    }

    #[tokio::test]
    async fn test_create_registro_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let session = test_session();

        let result = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Azul", "Acme", 0.0, 1),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0.0 })));

        let result = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Azul", "Acme", f64::NAN, 1),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let result = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Azul", "Acme", 10.0, 0),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidQuantity { quantity: 0 })));

        let result = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "  ", "Acme", 10.0, 1),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { field: "salon", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_registro_computes_total() -> Result<()> {
        let (db, session) = setup_with_session().await?;

        let registro = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Azul", "Acme", 1_500.0, 4),
        )
        .await?;

        assert_eq!(registro.total, 6_000.0);
        assert_eq!(registro.user_id, session.user_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_registro_recomputes_total() -> Result<()> {
        let (db, session) = setup_with_session().await?;
        let registro = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Azul", "Acme", 100.0, 2),
        )
        .await?;

        let updated = update_registro(
            &db,
            &session,
            registro.id,
            sample_registro("2024-03-15", "Azul", "Acme", 250.0, 3),
        )
        .await?;

        assert_eq!(updated.id, registro.id);
        assert_eq!(updated.total, 750.0);

        let stored = get_registro(&db, &session, registro.id).await?.unwrap();
        assert_eq!(stored.total, stored.valor * f64::from(stored.cantidad));
        Ok(())
    }

    #[tokio::test]
    async fn test_registros_are_scoped_to_owner() -> Result<()> {
        let (db, session) = setup_with_session().await?;
        let other = Session::new("otro", None);

        let registro = create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Azul", "Acme", 100.0, 1),
        )
        .await?;

        assert!(get_registro(&db, &other, registro.id).await?.is_none());
        assert!(
            list_registros(&db, &other, &RegistroFilter::default())
                .await?
                .is_empty()
        );
        assert!(matches!(
            delete_registro(&db, &other, registro.id).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            update_registro(
                &db,
                &other,
                registro.id,
                sample_registro("2024-03-15", "Azul", "Acme", 1.0, 1)
            )
            .await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_registros_filter_and_order() -> Result<()> {
        let (db, session) = setup_with_session().await?;
        create_registro(
            &db,
            &session,
            sample_registro("2024-01-10", "Azul", "Acme", 100.0, 1),
        )
        .await?;
        create_registro(
            &db,
            &session,
            sample_registro("2024-03-15", "Rojo", "Acme", 100.0, 1),
        )
        .await?;
        create_registro(
            &db,
            &session,
            sample_registro("2024-02-20", "Azul", "Globex", 100.0, 1),
        )
        .await?;

        let all = list_registros(&db, &session, &RegistroFilter::default()).await?;
        let fechas: Vec<String> = all.iter().map(|r| r.fecha.to_string()).collect();
        assert_eq!(fechas, ["2024-03-15", "2024-02-20", "2024-01-10"]);

        let filter = RegistroFilter {
            salon: Some("Azul".to_string()),
            desde: Some(date("2024-02-01")),
            ..Default::default()
        };
        let filtered = list_registros(&db, &session, &filter).await?;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].compania, "Globex");

        // In-memory matching agrees with the store query
        let in_memory: Vec<_> = all.into_iter().filter(|r| filter.matches(r)).collect();
        assert_eq!(in_memory, filtered);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_registros_batch() -> Result<()> {
        let (db, session) = setup_with_session().await?;

        let inserted = create_registros(
            &db,
            &session,
            vec![
                sample_registro("2024-03-15", "Azul", "Acme", 100.0, 2),
                sample_registro("2024-03-16", "Azul", "Acme", 50.0, 3),
            ],
        )
        .await?;
        assert_eq!(inserted, 2);

        let stored = list_registros(&db, &session, &RegistroFilter::default()).await?;
        let totals: Vec<f64> = stored.iter().map(|r| r.total).collect();
        assert_eq!(totals, [150.0, 200.0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_registros_batch_is_all_or_nothing() -> Result<()> {
        let (db, session) = setup_with_session().await?;

        let result = create_registros(
            &db,
            &session,
            vec![
                sample_registro("2024-03-15", "Azul", "Acme", 100.0, 2),
                sample_registro("2024-03-16", "Azul", "Acme", -5.0, 3),
            ],
        )
        .await;
        assert!(result.is_err());
        assert!(
            list_registros(&db, &session, &RegistroFilter::default())
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_registros_large_batch() -> Result<()> {
        let (db, session) = setup_with_session().await?;
        let inputs: Vec<NewRegistro> = (0..3000)
            .map(|i| {
                let mut input = sample_registro("2024-03-15", "Azul", "Acme", 1500.0, 1);
                input.item = format!("Item {i}");
                input
            })
            .collect();

        assert_eq!(create_registros(&db, &session, inputs).await?, 3000);
        let stored = list_registros(&db, &session, &RegistroFilter::default()).await?;
        assert_eq!(stored.len(), 3000);
        Ok(())
    }
}
