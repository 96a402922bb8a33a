/// KPIs, grouped totals, time series and Pareto breakdowns
pub mod analytics;

/// Equipment inventory CRUD and bulk loads
pub mod articulo;

/// Chat assistant turns against a text-generation backend
pub mod assistant;

/// Per-event views derived from registros and reservas
pub mod evento;

/// CSV export of registros, events and inventory
pub mod export;

/// Spreadsheet import and normalization
pub mod import;

/// Revenue line CRUD
pub mod registro;

/// Display formatting for derived views
pub mod report;

/// Stock reservations and availability
pub mod reserva;

/// Signed-in user identity
pub mod session;
