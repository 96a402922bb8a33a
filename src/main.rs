use clap::Parser;
use dotenvy::dotenv;
use eventario::{
    cli::{self, AppContext, Cli},
    config::{database, settings},
    errors::Result,
};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env may carry RUST_LOG, so it goes before the subscriber
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Command failed: {e}");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let settings = settings::load_default_config()?;
    let database_url = database::get_database_url(settings.database.url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to open database: {e}"))?;
    database::create_tables(&db).await?;
    debug!("Database ready");

    let ctx = AppContext::new(db, settings);
    cli::execute(cli.command, &ctx).await
}
