//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the record collections of the data store.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod articulo;
pub mod registro;
pub mod reserva;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use articulo::{Column as ArticuloColumn, Entity as Articulo, Model as ArticuloModel};
pub use registro::{
    Column as RegistroColumn, Entity as Registro, Model as RegistroModel, TipoRegistro,
};
pub use reserva::{Column as ReservaColumn, Entity as Reserva, Model as ReservaModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
