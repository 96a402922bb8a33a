//! Command handlers organized by area.
//!
//! Every handler returns the lines to print; failures propagate as
//! [`crate::errors::Error`] and are rendered once by the binary.

/// `dashboard` and `pareto`
pub mod analytics;

/// `articulo add|list|update|delete`
pub mod articulo;

/// `chat`
pub mod chat;

/// `evento list|show`
pub mod evento;

/// `registro add|list|update|delete`
pub mod registro;

/// `reserva add|update|delete|list`
pub mod reserva;

/// `login`, `logout` and `whoami`
pub mod session;

/// `import` and `export`
pub mod transfer;
