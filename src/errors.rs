//! Unified error types for `Eventario`.
//!
//! Every store, parsing and backend failure funnels into [`Error`]. Front ends
//! only ever show [`Error::user_message`], a single human-readable line.

use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The data store rejected or failed a request
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A field failed validation (empty text, forbidden character, ...)
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        message: String,
    },

    /// Monetary amount that is zero, negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Quantity that is zero or negative
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// A reservation asked for more units than are free
    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        /// Units free for this article
        available: i64,
        /// Units the reservation asked for
        requested: i64,
    },

    /// A record lookup came back empty
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record (`registro`, `articulo`, ...)
        entity: &'static str,
        /// Identifier that was looked up
        key: String,
    },

    /// A spreadsheet could not be read
    #[error("Import error: {message}")]
    Import {
        /// What went wrong
        message: String,
    },

    /// The text-generation backend failed
    #[error("Assistant error: {message}")]
    Assistant {
        /// What went wrong
        message: String,
    },

    /// An operation needed a session and there is none
    #[error("No active session, sign in first")]
    NotSignedIn,

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The single message shown to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) => {
                "No se pudo completar la operación con la base de datos".to_string()
            }
            Self::InsufficientStock {
                available,
                requested,
            } => format!(
                "Stock insuficiente: disponible {available}, solicitado {requested}"
            ),
            Self::NotSignedIn => "Debes iniciar sesión".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Import {
            message: value.to_string(),
        }
    }
}

impl From<calamine::Error> for Error {
    fn from(value: calamine::Error) -> Self {
        Self::Import {
            message: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Assistant {
            message: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse settings: {value}"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Config {
            message: format!("Invalid stored state: {value}"),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
