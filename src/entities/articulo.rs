//! Articulo entity - A physical inventory item.
//!
//! `en_stock` is the quantity on hand. What is free for a given event is derived
//! from it by subtracting reservations, see [`crate::core::reserva`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Articulo database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articulos")]
pub struct Model {
    /// Unique identifier for the articulo
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business code of the item, unique across the inventory
    #[sea_orm(unique)]
    pub codigo_articulo: String,
    /// Top-level inventory group (e.g., "Audio", "Iluminación")
    pub grupo: String,
    /// Subgroup within `grupo`
    pub subgrupo: String,
    /// Free-text description
    pub descripcion: String,
    /// Units on hand
    pub en_stock: i32,
    /// When the articulo was created
    pub created_at: DateTime,
    /// When the articulo was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Articulo and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One articulo has many reservas
    #[sea_orm(has_many = "super::reserva::Entity")]
    Reservas,
}

impl Related<super::reserva::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
