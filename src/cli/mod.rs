//! Command-line front end - argument definitions and dispatch.
//!
//! Handlers live in [`commands`], one module per area. Each returns the text
//! to print, so the binary only parses arguments, calls [`execute`] and prints.

/// Handler implementations organized by area
pub mod commands;

use crate::{
    config::settings::Settings,
    core::{assistant::HttpTextGenerator, import, registro::RegistroFilter},
    entities::TipoRegistro,
    errors::Result,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// Everything a handler needs.
pub struct AppContext {
    /// Store connection
    pub db: DatabaseConnection,
    /// Loaded settings
    pub settings: Settings,
}

impl AppContext {
    /// Bundles a connection with its settings.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self { db, settings }
    }
}

/// Event inventory and revenue ledger.
#[derive(Debug, Parser)]
#[command(name = "eventario", author, version)]
pub struct Cli {
    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a session, replacing any previous one
    Login {
        /// User identity
        user_id: String,
        /// Contact address
        #[arg(long)]
        email: Option<String>,
    },
    /// Close the active session
    Logout,
    /// Show the active session
    Whoami,
    /// Manage revenue lines
    #[command(subcommand)]
    Registro(RegistroCommand),
    /// Browse events
    #[command(subcommand)]
    Evento(EventoCommand),
    /// Manage the equipment inventory
    #[command(subcommand)]
    Articulo(ArticuloCommand),
    /// Manage stock reservations
    #[command(subcommand)]
    Reserva(ReservaCommand),
    /// KPIs and grouped revenue
    Dashboard(FilterArgs),
    /// Items making up most of the revenue
    Pareto {
        /// Which registros to include
        #[command(flatten)]
        filter: FilterArgs,
        /// Cumulative share to cover, 0 to 1; defaults to the configured value
        #[arg(long)]
        umbral: Option<f64>,
    },
    /// Load a spreadsheet
    #[command(subcommand)]
    Import(ImportCommand),
    /// Write a CSV file
    #[command(subcommand)]
    Export(ExportCommand),
    /// Ask the assistant about your figures
    Chat {
        /// The question
        #[arg(required = true, num_args = 1..)]
        pregunta: Vec<String>,
    },
}

/// Registro subcommands.
#[derive(Debug, Subcommand)]
pub enum RegistroCommand {
    /// Add a revenue line
    Add(RegistroArgs),
    /// List revenue lines
    List(FilterArgs),
    /// Replace a revenue line
    Update {
        /// Registro id
        id: i64,
        /// New values
        #[command(flatten)]
        registro: RegistroArgs,
    },
    /// Delete a revenue line
    Delete {
        /// Registro id
        id: i64,
    },
}

/// Evento subcommands.
#[derive(Debug, Subcommand)]
pub enum EventoCommand {
    /// List events
    List(FilterArgs),
    /// Show one event with its lines, reservations and stock
    Show {
        /// Event key, `YYYY-MM-DD|salon|compania`
        key: String,
    },
}

/// Articulo subcommands.
#[derive(Debug, Subcommand)]
pub enum ArticuloCommand {
    /// Add an inventory item
    Add(ArticuloArgs),
    /// List inventory items
    List {
        /// Only this group
        #[arg(long)]
        grupo: Option<String>,
    },
    /// Replace an inventory item
    Update {
        /// Articulo id
        id: i64,
        /// New values
        #[command(flatten)]
        articulo: ArticuloArgs,
    },
    /// Delete an inventory item and its reservations
    Delete {
        /// Articulo id
        id: i64,
    },
}

/// Reserva subcommands.
#[derive(Debug, Subcommand)]
pub enum ReservaCommand {
    /// Reserve stock for an event
    Add {
        /// Event key, `YYYY-MM-DD|salon|compania`
        #[arg(long)]
        evento: String,
        /// Articulo code
        #[arg(long)]
        articulo: String,
        /// Units to hold
        #[arg(long, allow_negative_numbers = true)]
        cantidad: i32,
    },
    /// Change how many units a reservation holds
    Update {
        /// Reserva id
        id: i64,
        /// New number of units
        #[arg(long, allow_negative_numbers = true)]
        cantidad: i32,
    },
    /// Release a reservation
    Delete {
        /// Reserva id
        id: i64,
    },
    /// List your reservations
    List {
        /// First date included
        #[arg(long, value_parser = parse_date_arg)]
        desde: Option<NaiveDate>,
        /// Last date included
        #[arg(long, value_parser = parse_date_arg)]
        hasta: Option<NaiveDate>,
    },
}

/// Import subcommands.
#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Load revenue lines from `.csv`, `.xlsx` or `.xls`
    Registros {
        /// Spreadsheet path
        path: PathBuf,
        /// Tipo for rows with a blank tipo cell
        #[arg(long, value_parser = parse_tipo_arg)]
        tipo: Option<TipoRegistro>,
    },
    /// Load or update inventory items by code
    Articulos {
        /// Spreadsheet path
        path: PathBuf,
    },
}

/// Export subcommands.
#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Revenue lines
    Registros {
        /// Output path
        path: PathBuf,
        /// Which registros to include
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// One row per event
    Eventos {
        /// Output path
        path: PathBuf,
        /// Which registros to include
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// The whole inventory
    Articulos {
        /// Output path
        path: PathBuf,
    },
}

/// Optional registro constraints shared by listing commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// First date included
    #[arg(long, value_parser = parse_date_arg)]
    pub desde: Option<NaiveDate>,
    /// Last date included
    #[arg(long, value_parser = parse_date_arg)]
    pub hasta: Option<NaiveDate>,
    /// Exact venue
    #[arg(long)]
    pub salon: Option<String>,
    /// Exact client company
    #[arg(long)]
    pub compania: Option<String>,
    /// Exact tipo
    #[arg(long, value_parser = parse_tipo_arg)]
    pub tipo: Option<TipoRegistro>,
}

impl From<FilterArgs> for RegistroFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            desde: args.desde,
            hasta: args.hasta,
            salon: args.salon,
            compania: args.compania,
            tipo: args.tipo,
        }
    }
}

/// Fields of a revenue line.
#[derive(Debug, Clone, Args)]
pub struct RegistroArgs {
    /// Event date
    #[arg(long, value_parser = parse_date_arg)]
    pub fecha: NaiveDate,
    /// BEO code
    #[arg(long)]
    pub beo: Option<String>,
    /// Venue
    #[arg(long)]
    pub salon: String,
    /// Client company
    #[arg(long)]
    pub compania: String,
    /// Billed item
    #[arg(long)]
    pub item: String,
    /// Kind of line; defaults to the configured import tipo
    #[arg(long, value_parser = parse_tipo_arg)]
    pub tipo: Option<TipoRegistro>,
    /// Unit price
    #[arg(long, allow_negative_numbers = true)]
    pub valor: f64,
    /// Units billed
    #[arg(long, allow_negative_numbers = true)]
    pub cantidad: i32,
}

/// Fields of an inventory item.
#[derive(Debug, Clone, Args)]
pub struct ArticuloArgs {
    /// Business code
    #[arg(long)]
    pub codigo: String,
    /// Inventory group
    #[arg(long, default_value = "")]
    pub grupo: String,
    /// Inventory subgroup
    #[arg(long, default_value = "")]
    pub subgrupo: String,
    /// Description
    #[arg(long)]
    pub descripcion: String,
    /// Units on hand
    #[arg(long, allow_negative_numbers = true)]
    pub stock: i32,
}

fn parse_date_arg(raw: &str) -> std::result::Result<NaiveDate, String> {
    import::parse_fecha(raw).ok_or_else(|| format!("fecha inválida '{raw}'"))
}

fn parse_tipo_arg(raw: &str) -> std::result::Result<TipoRegistro, String> {
    if raw.trim().is_empty() {
        return Err("tipo vacío".to_string());
    }
    import::parse_tipo(raw, TipoRegistro::Estandar).ok_or_else(|| {
        format!("tipo desconocido '{raw}' (Venta, SubArriendo, Estándar, Adicional)")
    })
}

/// Runs one command and returns what to print.
pub async fn execute(command: Command, ctx: &AppContext) -> Result<String> {
    use self::commands::{analytics, articulo, chat, evento, registro, reserva, session, transfer};

    let lines = match command {
        Command::Login { user_id, email } => session::login(ctx, &user_id, email).await?,
        Command::Logout => session::logout(ctx).await?,
        Command::Whoami => session::whoami(ctx).await?,
        Command::Registro(cmd) => match cmd {
            RegistroCommand::Add(args) => registro::add(ctx, args).await?,
            RegistroCommand::List(filter) => registro::list(ctx, filter.into()).await?,
            RegistroCommand::Update { id, registro: args } => {
                registro::update(ctx, id, args).await?
            }
            RegistroCommand::Delete { id } => registro::delete(ctx, id).await?,
        },
        Command::Evento(cmd) => match cmd {
            EventoCommand::List(filter) => evento::list(ctx, filter.into()).await?,
            EventoCommand::Show { key } => evento::show(ctx, &key).await?,
        },
        Command::Articulo(cmd) => match cmd {
            ArticuloCommand::Add(args) => articulo::add(ctx, args).await?,
            ArticuloCommand::List { grupo } => articulo::list(ctx, grupo.as_deref()).await?,
            ArticuloCommand::Update { id, articulo: args } => {
                articulo::update(ctx, id, args).await?
            }
            ArticuloCommand::Delete { id } => articulo::delete(ctx, id).await?,
        },
        Command::Reserva(cmd) => match cmd {
            ReservaCommand::Add {
                evento,
                articulo,
                cantidad,
            } => reserva::add(ctx, &evento, &articulo, cantidad).await?,
            ReservaCommand::Update { id, cantidad } => reserva::update(ctx, id, cantidad).await?,
            ReservaCommand::Delete { id } => reserva::delete(ctx, id).await?,
            ReservaCommand::List { desde, hasta } => reserva::list(ctx, desde, hasta).await?,
        },
        Command::Dashboard(filter) => analytics::dashboard(ctx, filter.into()).await?,
        Command::Pareto { filter, umbral } => {
            analytics::pareto(ctx, filter.into(), umbral).await?
        }
        Command::Import(cmd) => match cmd {
            ImportCommand::Registros { path, tipo } => {
                transfer::import_registros(ctx, &path, tipo).await?
            }
            ImportCommand::Articulos { path } => transfer::import_articulos(ctx, &path).await?,
        },
        Command::Export(cmd) => match cmd {
            ExportCommand::Registros { path, filter } => {
                transfer::export_registros(ctx, &path, filter.into()).await?
            }
            ExportCommand::Eventos { path, filter } => {
                transfer::export_eventos(ctx, &path, filter.into()).await?
            }
            ExportCommand::Articulos { path } => transfer::export_articulos(ctx, &path).await?,
        },
        Command::Chat { pregunta } => {
            let generator = HttpTextGenerator::from_env(&ctx.settings.assistant)?;
            chat::chat(ctx, &generator, &pregunta.join(" ")).await?
        }
    };
    Ok(lines.join("\n"))
}
