//! System state entity - small JSON documents addressed by a string key.
//! The active session lives here under `"active_session"`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One key/value entry
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Entry name, unique
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// JSON document
    pub value: Json,
    /// When the entry was last written
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
