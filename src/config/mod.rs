/// Database connection management and schema creation
pub mod database;

/// Application settings loading from `eventario.toml` and the environment
pub mod settings;
