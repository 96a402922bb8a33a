//! Database configuration module for `Eventario`.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity`, so the schema
//! always matches the entity definitions without hand-written SQL.

use crate::entities::{Articulo, Registro, Reserva, SystemState};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, instrument};

/// Default store location when neither `DATABASE_URL` nor the settings file name one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/eventario.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling
/// back to `configured` and then to [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first, so a
/// fresh checkout can start without any setup.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        debug!("Ensuring database directory {dir} exists");
        std::fs::create_dir_all(dir)?;
    }
    let db = Database::connect(database_url).await?;
    debug!("Database connection opened");
    Ok(db)
}

fn sqlite_parent_dir(database_url: &str) -> Option<&str> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    let (dir, _file) = path.rsplit_once('/')?;
    (!dir.is_empty()).then_some(dir)
}

/// Creates all tables from the entity definitions if they do not exist yet.
///
/// Order matters: `reservas` references `articulos`.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut registro_table = schema.create_table_from_entity(Registro);
    let mut articulo_table = schema.create_table_from_entity(Articulo);
    let mut reserva_table = schema.create_table_from_entity(Reserva);
    let mut system_state_table = schema.create_table_from_entity(SystemState);

    for table in [
        &mut registro_table,
        &mut articulo_table,
        &mut reserva_table,
        &mut system_state_table,
    ] {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    debug!("Database tables ensured");
    Ok(())
}
