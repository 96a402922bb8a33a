//! Registro commands.

use crate::{
    cli::{AppContext, RegistroArgs},
    core::{
        registro::{self, NewRegistro, RegistroFilter},
        report::format_clp,
        session,
    },
    entities::{TipoRegistro, registro as registro_entity},
    errors::Result,
};

fn to_input(args: RegistroArgs, default_tipo: TipoRegistro) -> NewRegistro {
    NewRegistro {
        fecha: args.fecha,
        beo: args.beo,
        salon: args.salon,
        compania: args.compania,
        item: args.item,
        tipo: args.tipo.unwrap_or(default_tipo),
        valor: args.valor,
        cantidad: args.cantidad,
    }
}

/// One-line view of a registro.
///
/// Format: `#7 2024-03-15 | Azul | Acme | Sillas | Venta | 10 x $1.500 = $15.000`
#[must_use]
pub fn format_registro_line(r: &registro_entity::Model) -> String {
    let beo = r
        .beo
        .as_deref()
        .map(|b| format!(" | BEO {b}"))
        .unwrap_or_default();
    format!(
        "#{} {} | {} | {} | {} | {} | {} x {} = {}{beo}",
        r.id,
        r.fecha.format("%Y-%m-%d"),
        r.salon,
        r.compania,
        r.item,
        r.tipo,
        r.cantidad,
        format_clp(r.valor),
        format_clp(r.total),
    )
}

/// Adds a registro for the session user.
pub async fn add(ctx: &AppContext, args: RegistroArgs) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let input = to_input(args, ctx.settings.import.default_tipo);
    let created = registro::create_registro(&ctx.db, &session, input).await?;
    Ok(vec![format!(
        "Registro creado: {}",
        format_registro_line(&created)
    )])
}

/// Lists the session user's registros.
pub async fn list(ctx: &AppContext, filter: RegistroFilter) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let registros = registro::list_registros(&ctx.db, &session, &filter).await?;
    if registros.is_empty() {
        return Ok(vec!["Sin registros".to_string()]);
    }

    let total: f64 = registros.iter().map(|r| r.total).sum();
    let mut lines: Vec<String> = registros.iter().map(format_registro_line).collect();
    lines.push(format!(
        "{} registros, total {}",
        registros.len(),
        format_clp(total)
    ));
    Ok(lines)
}

/// Replaces a registro of the session user.
pub async fn update(ctx: &AppContext, id: i64, args: RegistroArgs) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let input = to_input(args, ctx.settings.import.default_tipo);
    let updated = registro::update_registro(&ctx.db, &session, id, input).await?;
    Ok(vec![format!(
        "Registro actualizado: {}",
        format_registro_line(&updated)
    )])
}

/// Deletes a registro of the session user.
pub async fn delete(ctx: &AppContext, id: i64) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    registro::delete_registro(&ctx.db, &session, id).await?;
    Ok(vec![format!("Registro #{id} eliminado")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::settings::Settings, errors::Error, test_utils::*};

    fn args(valor: f64, cantidad: i32) -> RegistroArgs {
        RegistroArgs {
            fecha: date("2024-03-15"),
            beo: Some("B-1".to_string()),
            salon: "Azul".to_string(),
            compania: "Acme".to_string(),
            item: "Sillas".to_string(),
            tipo: None,
            valor,
            cantidad,
        }
    }

    #[test]
    fn test_format_registro_line() {
        let mut r = registro_model(7, "2024-03-15", "Azul", "Acme", TipoRegistro::Venta, 1500.0, 10);
        assert_eq!(
            format_registro_line(&r),
            "#7 2024-03-15 | Azul | Acme | Sillas | Venta | 10 x $1.500 = $15.000"
        );
        r.beo = Some("B-9".to_string());
        assert!(format_registro_line(&r).ends_with(" | BEO B-9"));
    }

    #[tokio::test]
    async fn test_add_uses_configured_default_tipo() -> Result<()> {
        let (db, _) = setup_with_session().await?;
        let mut settings = Settings::default();
        settings.import.default_tipo = TipoRegistro::Adicional;
        let ctx = AppContext::new(db, settings);

        let lines = add(&ctx, args(100.0, 2)).await?;
        assert!(lines[0].contains("| Adicional |"));

        let listed = list(&ctx, RegistroFilter::default()).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1], "1 registros, total $200");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete() -> Result<()> {
        let (db, _) = setup_with_session().await?;
        let ctx = AppContext::new(db, Settings::default());
        add(&ctx, args(100.0, 2)).await?;
        let id = registro::list_registros(&ctx.db, &test_session(), &RegistroFilter::default())
            .await?[0]
            .id;

        let lines = update(&ctx, id, args(50.0, 3)).await?;
        assert!(lines[0].ends_with("3 x $50 = $150 | BEO B-1"));

        let invalid = update(&ctx, id, args(50.0, 0)).await;
        assert!(matches!(invalid, Err(Error::InvalidQuantity { quantity: 0 })));

        delete(&ctx, id).await?;
        assert_eq!(list(&ctx, RegistroFilter::default()).await?, ["Sin registros"]);
        Ok(())
    }
}
