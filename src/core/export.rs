//! Spreadsheet export of registros, events and inventory.
//!
//! Files are UTF-8 CSV with a byte-order mark and `;` as the separator, which
//! is what spreadsheet software in Spanish locales opens without an import
//! wizard.

use crate::{
    core::{
        articulo,
        evento::{self, Evento},
        registro::{self, RegistroFilter},
        session::Session,
    },
    entities::{articulo as articulo_entity, registro as registro_entity},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::{fs::File, io::Write, path::Path};
use tracing::{info, instrument};

/// UTF-8 byte-order mark.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";
/// Column separator.
pub const SEPARATOR: u8 = b';';

const REGISTRO_COLUMNS: [&str; 9] = [
    "Fecha", "BEO", "Salón", "Compañía", "Item", "Tipo", "Valor", "Cantidad", "Total",
];
const EVENTO_COLUMNS: [&str; 8] = [
    "Fecha",
    "Salón",
    "Compañía",
    "BEO",
    "Ítems",
    "Unidades",
    "Total",
    "Unidades reservadas",
];
const ARTICULO_COLUMNS: [&str; 5] = ["Código", "Grupo", "Subgrupo", "Descripción", "En stock"];

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn csv_writer<W: Write>(mut out: W) -> Result<csv::Writer<W>> {
    out.write_all(BOM)?;
    Ok(csv::WriterBuilder::new()
        .delimiter(SEPARATOR)
        .from_writer(out))
}

/// Writes registros as CSV. Returns the number of data rows.
pub fn write_registros<W: Write>(out: W, registros: &[registro_entity::Model]) -> Result<usize> {
    let mut writer = csv_writer(out)?;
    writer.write_record(REGISTRO_COLUMNS)?;
    for r in registros {
        writer.write_record([
            r.fecha.format("%Y-%m-%d").to_string(),
            r.beo.clone().unwrap_or_default(),
            r.salon.clone(),
            r.compania.clone(),
            r.item.clone(),
            r.tipo.label().to_string(),
            money(r.valor),
            r.cantidad.to_string(),
            money(r.total),
        ])?;
    }
    writer.flush()?;
    Ok(registros.len())
}

/// Writes one row per event. Several BEO codes are joined with `, `.
pub fn write_eventos<W: Write>(out: W, eventos: &[Evento]) -> Result<usize> {
    let mut writer = csv_writer(out)?;
    writer.write_record(EVENTO_COLUMNS)?;
    for e in eventos {
        let beos: Vec<&str> = e.beos.iter().map(String::as_str).collect();
        writer.write_record([
            e.key.fecha.format("%Y-%m-%d").to_string(),
            e.key.salon.clone(),
            e.key.compania.clone(),
            beos.join(", "),
            e.item_count.to_string(),
            e.unidades.to_string(),
            money(e.total),
            e.unidades_reservadas().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(eventos.len())
}

/// Writes the inventory.
pub fn write_articulos<W: Write>(out: W, articulos: &[articulo_entity::Model]) -> Result<usize> {
    let mut writer = csv_writer(out)?;
    writer.write_record(ARTICULO_COLUMNS)?;
    for a in articulos {
        writer.write_record([
            a.codigo_articulo.as_str(),
            a.grupo.as_str(),
            a.subgrupo.as_str(),
            a.descripcion.as_str(),
            a.en_stock.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(articulos.len())
}

/// Exports the session user's registros matching `filter` to `path`.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn export_registros(
    db: &DatabaseConnection,
    session: &Session,
    filter: &RegistroFilter,
    path: &Path,
) -> Result<usize> {
    let registros = registro::list_registros(db, session, filter).await?;
    let rows = write_registros(File::create(path)?, &registros)?;
    info!(rows, path = %path.display(), "Registros exported");
    Ok(rows)
}

/// Exports the session user's events matching `filter` to `path`.
#[instrument(skip(db, session), fields(user_id = %session.user_id))]
pub async fn export_eventos(
    db: &DatabaseConnection,
    session: &Session,
    filter: &RegistroFilter,
    path: &Path,
) -> Result<usize> {
    let eventos = evento::load_events(db, session, filter).await?;
    let rows = write_eventos(File::create(path)?, &eventos)?;
    info!(rows, path = %path.display(), "Eventos exported");
    Ok(rows)
}

/// Exports the whole inventory to `path`.
#[instrument(skip(db))]
pub async fn export_articulos(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    let articulos = articulo::list_articulos(db, None).await?;
    let rows = write_articulos(File::create(path)?, &articulos)?;
    info!(rows, path = %path.display(), "Articulos exported");
    Ok(rows)
}
