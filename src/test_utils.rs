//! Shared test utilities for `Eventario`.
//!
//! This module provides common helper functions for setting up test databases
//! and building registros, reservas and articulos with sensible defaults.

use crate::{
    core::{
        articulo::{self, NewArticulo},
        registro::{NewRegistro, compute_total},
        session::{self, Session},
    },
    entities::{TipoRegistro, articulo as articulo_entity, registro, reserva},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// User id every helper session uses.
pub const TEST_USER: &str = "test_user";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Session for [`TEST_USER`], not persisted.
#[must_use]
pub fn test_session() -> Session {
    Session::new(TEST_USER, Some("test@example.com".to_string()))
}

/// Test database with [`TEST_USER`] signed in.
pub async fn setup_with_session() -> Result<(DatabaseConnection, Session)> {
    let db = setup_test_db().await?;
    let session =
        session::sign_in(&db, TEST_USER, Some("test@example.com".to_string())).await?;
    Ok((db, session))
}

/// Parses an ISO date literal.
///
/// # Panics
/// Panics if `iso` is not `YYYY-MM-DD`.
#[must_use]
#[allow(clippy::expect_used)]
pub fn date(iso: &str) -> NaiveDate {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").expect("test date must be YYYY-MM-DD")
}

/// Registro input with sensible defaults.
///
/// # Defaults
/// * `item`: "Sillas"
/// * `tipo`: Venta
/// * `beo`: None
#[must_use]
pub fn sample_registro(
    fecha: &str,
    salon: &str,
    compania: &str,
    valor: f64,
    cantidad: i32,
) -> NewRegistro {
    NewRegistro {
        fecha: date(fecha),
        beo: None,
        salon: salon.to_string(),
        compania: compania.to_string(),
        item: "Sillas".to_string(),
        tipo: TipoRegistro::Venta,
        valor,
        cantidad,
    }
}

/// Stored registro for pure-function tests; owned by [`TEST_USER`], item "Sillas".
#[must_use]
pub fn registro_model(
    id: i64,
    fecha: &str,
    salon: &str,
    compania: &str,
    tipo: TipoRegistro,
    valor: f64,
    cantidad: i32,
) -> registro::Model {
    let now = chrono::Utc::now().naive_utc();
    registro::Model {
        id,
        user_id: TEST_USER.to_string(),
        fecha: date(fecha),
        beo: None,
        salon: salon.to_string(),
        compania: compania.to_string(),
        item: "Sillas".to_string(),
        tipo,
        valor,
        cantidad,
        total: compute_total(valor, cantidad),
        created_at: now,
        updated_at: now,
    }
}

/// Stored reserva for pure-function tests.
///
/// `fecha` is taken from the key's date prefix; malformed keys get 2000-01-01.
#[must_use]
pub fn reserva_model(id: i64, articulo_id: i64, evento_key: &str, cantidad: i32) -> reserva::Model {
    let now = chrono::Utc::now().naive_utc();
    let fecha = evento_key
        .split('|')
        .next()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| date("2000-01-01"));
    reserva::Model {
        id,
        articulo_id,
        evento_key: evento_key.to_string(),
        fecha,
        cantidad_reservada: cantidad,
        user_id: TEST_USER.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Stored articulo for pure-function tests.
#[must_use]
pub fn articulo_model(id: i64, codigo: &str, en_stock: i32) -> articulo_entity::Model {
    let now = chrono::Utc::now().naive_utc();
    articulo_entity::Model {
        id,
        codigo_articulo: codigo.to_string(),
        grupo: "Mobiliario".to_string(),
        subgrupo: "Sillas".to_string(),
        descripcion: format!("Articulo {codigo}"),
        en_stock,
        created_at: now,
        updated_at: now,
    }
}

/// Articulo input with sensible defaults.
///
/// # Defaults
/// * `grupo`: "Mobiliario"
/// * `subgrupo`: "Sillas"
/// * `descripcion`: "Articulo {codigo}"
#[must_use]
pub fn new_articulo(codigo: &str, en_stock: i32) -> NewArticulo {
    NewArticulo {
        codigo_articulo: codigo.to_string(),
        grupo: "Mobiliario".to_string(),
        subgrupo: "Sillas".to_string(),
        descripcion: format!("Articulo {codigo}"),
        en_stock,
    }
}

/// Stores an articulo built by [`new_articulo`].
pub async fn create_test_articulo(
    db: &DatabaseConnection,
    codigo: &str,
    en_stock: i32,
) -> Result<articulo_entity::Model> {
    articulo::create_articulo(db, new_articulo(codigo, en_stock)).await
}

/// Writes `contents` to a process-unique file in the temp dir and returns its path.
/// Callers remove the file when done.
pub fn write_temp_file(name: &str, contents: &str) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("eventario_{}_{name}", std::process::id()));
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
