//! Reserva commands.

use crate::{
    cli::AppContext,
    core::{
        articulo,
        evento::EventKey,
        reserva,
        session,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;

/// Reserves `cantidad` units of the articulo with code `codigo` for an event.
pub async fn add(
    ctx: &AppContext,
    evento_key: &str,
    codigo: &str,
    cantidad: i32,
) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let key: EventKey = evento_key.parse()?;
    let articulo = articulo::get_articulo_by_codigo(&ctx.db, codigo)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "articulo",
            key: codigo.to_string(),
        })?;

    let created = reserva::create_reserva(&ctx.db, &session, articulo.id, &key, cantidad).await?;
    Ok(vec![format!(
        "Reserva #{}: {} x {} para {key}",
        created.id, articulo.codigo_articulo, created.cantidad_reservada
    )])
}

/// Changes the units a reserva holds.
pub async fn update(ctx: &AppContext, id: i64, cantidad: i32) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let updated = reserva::update_reserva_cantidad(&ctx.db, &session, id, cantidad).await?;
    Ok(vec![format!(
        "Reserva #{} ahora reserva {} unidades",
        updated.id, updated.cantidad_reservada
    )])
}

/// Releases a reserva.
pub async fn delete(ctx: &AppContext, id: i64) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    reserva::delete_reserva(&ctx.db, &session, id).await?;
    Ok(vec![format!("Reserva #{id} eliminada")])
}

/// Lists the session user's reservas in a date range.
pub async fn list(
    ctx: &AppContext,
    desde: Option<NaiveDate>,
    hasta: Option<NaiveDate>,
) -> Result<Vec<String>> {
    let session = session::require_session(&ctx.db).await?;
    let reservas = reserva::list_reservas(&ctx.db, &session, desde, hasta).await?;
    if reservas.is_empty() {
        return Ok(vec!["Sin reservas".to_string()]);
    }
    Ok(reservas
        .iter()
        .map(|r| {
            format!(
                "#{} {} | artículo #{} x {}",
                r.id, r.evento_key, r.articulo_id, r.cantidad_reservada
            )
        })
        .collect())
}
