//! Articulo commands. The inventory is shared, so none of these need a session.

use crate::{
    cli::{AppContext, ArticuloArgs},
    core::articulo::{self, NewArticulo},
    entities::articulo as articulo_entity,
    errors::Result,
};

impl From<ArticuloArgs> for NewArticulo {
    fn from(args: ArticuloArgs) -> Self {
        Self {
            codigo_articulo: args.codigo,
            grupo: args.grupo,
            subgrupo: args.subgrupo,
            descripcion: args.descripcion,
            en_stock: args.stock,
        }
    }
}

fn format_articulo_line(a: &articulo_entity::Model) -> String {
    format!(
        "#{} {} | {}/{} | {} | stock {}",
        a.id, a.codigo_articulo, a.grupo, a.subgrupo, a.descripcion, a.en_stock
    )
}

/// Adds an articulo.
pub async fn add(ctx: &AppContext, args: ArticuloArgs) -> Result<Vec<String>> {
    let created = articulo::create_articulo(&ctx.db, args.into()).await?;
    Ok(vec![format!(
        "Artículo creado: {}",
        format_articulo_line(&created)
    )])
}

/// Lists articulos, optionally only one group.
pub async fn list(ctx: &AppContext, grupo: Option<&str>) -> Result<Vec<String>> {
    let articulos = articulo::list_articulos(&ctx.db, grupo).await?;
    if articulos.is_empty() {
        return Ok(vec!["Sin artículos".to_string()]);
    }
    Ok(articulos.iter().map(format_articulo_line).collect())
}

/// Replaces an articulo.
pub async fn update(ctx: &AppContext, id: i64, args: ArticuloArgs) -> Result<Vec<String>> {
    let updated = articulo::update_articulo(&ctx.db, id, args.into()).await?;
    Ok(vec![format!(
        "Artículo actualizado: {}",
        format_articulo_line(&updated)
    )])
}

/// Deletes an articulo and its reservas.
pub async fn delete(ctx: &AppContext, id: i64) -> Result<Vec<String>> {
    articulo::delete_articulo(&ctx.db, id).await?;
    Ok(vec![format!("Artículo #{id} eliminado")])
}
