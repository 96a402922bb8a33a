//! Import and export commands.

use crate::{
    cli::AppContext,
    core::{
        export,
        import::{self, SkippedRow},
        registro::RegistroFilter,
        session,
    },
    entities::TipoRegistro,
    errors::Result,
};
use std::path::Path;

fn skipped_lines(skipped: &[SkippedRow]) -> impl Iterator<Item = String> + '_ {
    skipped
        .iter()
        .map(|s| format!("  fila {}: {}", s.row, s.reason))
}

/// Imports registros for the session user.
pub async fn import_registros(
    ctx: &AppContext,
    path: &Path,
    tipo: Option<TipoRegistro>,
) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let default_tipo = tipo.unwrap_or(ctx.settings.import.default_tipo);
    let summary = import::import_registros(&ctx.db, &session, path, default_tipo).await?;

    let mut lines = vec![format!(
        "Filas leídas: {}, insertadas: {}, omitidas: {}",
        summary.leidas,
        summary.insertadas,
        summary.omitidas.len()
    )];
    lines.extend(skipped_lines(&summary.omitidas));
    Ok(lines)
}

/// Loads articulos, updating existing codes.
pub async fn import_articulos(ctx: &AppContext, path: &Path) -> Result<Vec<String>> {
    let summary = import::import_articulos(&ctx.db, path).await?;
    let mut lines = vec![format!(
        "Filas leídas: {}, nuevos: {}, actualizados: {}, omitidas: {}",
        summary.leidas,
        summary.counts.inserted,
        summary.counts.updated,
        summary.omitidas.len()
    )];
    lines.extend(skipped_lines(&summary.omitidas));
    Ok(lines)
}

/// Writes the session user's registros to CSV.
pub async fn export_registros(
    ctx: &AppContext,
    path: &Path,
    filter: RegistroFilter,
) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let rows = export::export_registros(&ctx.db, &session, &filter, path).await?;
    Ok(vec![format!("{rows} registros exportados a {}", path.display())])
}

/// Writes the session user's events to CSV.
pub async fn export_eventos(
    ctx: &AppContext,
    path: &Path,
    filter: RegistroFilter,
) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let rows = export::export_eventos(&ctx.db, &session, &filter, path).await?;
    Ok(vec![format!("{rows} eventos exportados a {}", path.display())])
}

/// Writes the inventory to CSV.
pub async fn export_articulos(ctx: &AppContext, path: &Path) -> Result<Vec<String>> {
    let rows = export::export_articulos(&ctx.db, path).await?;
    Ok(vec![format!("{rows} artículos exportados a {}", path.display())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::settings::Settings, test_utils::*};

    #[tokio::test]
    async fn test_import_then_export_registros() -> Result<()> {
        let (db, _) = setup_with_session().await?;
        let ctx = AppContext::new(db, Settings::default());
        let input = write_temp_file(
            "cli_import.csv",
            concat!(
                "FECHA;SALÓN;EMPRESA;Detalle;Precio Unitario;Cant\n",
                "2024-03-15;Azul;Acme;Sillas;$1.500;10\n",
                ";Azul;Acme;Mesas;2000;1\n",
            ),
        )?;

        let lines = import_registros(&ctx, &input, Some(TipoRegistro::Venta)).await?;
        std::fs::remove_file(&input)?;
        assert_eq!(lines[0], "Filas leídas: 2, insertadas: 1, omitidas: 1");
        assert_eq!(lines[1], "  fila 3: falta fecha");

        let output = write_temp_file("cli_export.csv", "")?;
        let lines = export_eventos(&ctx, &output, RegistroFilter::default()).await?;
        let bytes = std::fs::read(&output)?;
        std::fs::remove_file(&output)?;
        assert!(lines[0].starts_with("1 eventos exportados a "));
        assert!(bytes.starts_with(export::BOM));
        Ok(())
    }

    #[tokio::test]
    async fn test_import_articulos_counts() -> Result<()> {
        let ctx = AppContext::new(setup_test_db().await?, Settings::default());
        create_test_articulo(&ctx.db, "SIL-01", 1).await?;
        let input = write_temp_file(
            "cli_articulos.csv",
            "Código,Descripción,Stock\nSIL-01,Silla,20\nMES-01,Mesa,5\n",
        )?;

        let lines = import_articulos(&ctx, &input).await?;
        std::fs::remove_file(&input)?;
        assert_eq!(lines, ["Filas leídas: 2, nuevos: 1, actualizados: 1, omitidas: 0"]);
        Ok(())
    }
}
