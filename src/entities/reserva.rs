//! Reserva entity - Stock of one articulo held for one event.
//!
//! The event is referenced by its composite key string (`fecha|salon|compania`),
//! see [`crate::core::evento::EventKey`]. `fecha` is duplicated out of the key so
//! reservations can be filtered by date on the store side.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reserva database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservas")]
pub struct Model {
    /// Unique identifier for the reserva
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Reserved articulo
    pub articulo_id: i64,
    /// Event key, `YYYY-MM-DD|salon|compania`
    pub evento_key: String,
    /// Event date, same as the first key component
    pub fecha: Date,
    /// Units held
    pub cantidad_reservada: i32,
    /// User who made the reservation
    pub user_id: String,
    /// When the reserva was created
    pub created_at: DateTime,
    /// When the reserva was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Reserva and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reserva belongs to one articulo
    #[sea_orm(
        belongs_to = "super::articulo::Entity",
        from = "Column::ArticuloId",
        to = "super::articulo::Column::Id",
        on_delete = "Cascade"
    )]
    Articulo,
}

impl Related<super::articulo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Articulo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
