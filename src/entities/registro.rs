//! Registro entity - A billable line item.
//!
//! Each registro belongs to one user and one event (`fecha`, `salon`, `compania`).
//! `total` is stored for server-side sorting but is always derived from
//! `valor * cantidad` by the core layer; it is never taken from input.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of billable line
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TipoRegistro {
    /// Direct sale
    #[sea_orm(string_value = "Venta")]
    Venta,
    /// Equipment or space sub-rented from a third party
    #[sea_orm(string_value = "SubArriendo")]
    SubArriendo,
    /// Standard package line
    #[sea_orm(string_value = "Estándar")]
    Estandar,
    /// Extra charged on top of the package
    #[sea_orm(string_value = "Adicional")]
    Adicional,
}

impl TipoRegistro {
    /// Label shown to users and written to exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Venta => "Venta",
            Self::SubArriendo => "SubArriendo",
            Self::Estandar => "Estándar",
            Self::Adicional => "Adicional",
        }
    }
}

impl fmt::Display for TipoRegistro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Registro database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registros")]
pub struct Model {
    /// Unique identifier for the registro
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the record
    pub user_id: String,
    /// Event date
    pub fecha: Date,
    /// Optional BEO (banquet event order) code
    pub beo: Option<String>,
    /// Venue
    pub salon: String,
    /// Client company
    pub compania: String,
    /// Billed item description
    pub item: String,
    /// Kind of line
    pub tipo: TipoRegistro,
    /// Unit price
    pub valor: f64,
    /// Units billed
    pub cantidad: i32,
    /// `valor * cantidad`
    pub total: f64,
    /// When the registro was created
    pub created_at: DateTime,
    /// When the registro was last modified
    pub updated_at: DateTime,
}

/// Registros reference events only through their composite key, not a relation
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
