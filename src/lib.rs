use anyhow::Context;
use std::sync::Arc;

pub mod cli;
pub mod config;
pub mod db;
pub mod letters;
pub mod models;
pub mod pipeline;
pub mod tools;

pub use crate::cli::Cli;
pub use crate::config::Config;
pub use crate::db::{LetterStore, PgLetterStore};
pub use crate::pipeline::{Pipeline, RunReport};

/// Written into the `Producer` metadata of every secured PDF.
pub const PRODUCER: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// Log to stderr at the level the flags ask for; `RUST_LOG` still wins.
pub fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_target(cli.debug)
        .init();
}

/// One complete batch run.
pub async fn run(cli: &Cli) -> anyhow::Result<RunReport> {
    dotenvy::dotenv().ok();
    log::info!("{}", PRODUCER);

    let config = Config::load(cli.config.as_deref())?;

    log::debug!("Opening database {}", database_label(&config));
    let store = PgLetterStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let literals = store
        .probe()
        .await
        .context("database health check failed")?;
    log::debug!("Database opened, Count(tliterals)={}", literals);

    let pipeline = Pipeline::new(config, Arc::new(store), Arc::new(tools::SystemRunner))?;
    let report = pipeline.run().await?;
    report.log_summary();

    log::info!("Run complete");
    Ok(report)
}

fn database_label(config: &Config) -> String {
    match &config.database.url {
        Some(_) => "from DATABASE_URL".to_string(),
        None => format!(
            "{}@{}:{}/{}",
            config.database.user, config.database.host, config.database.port, config.database.name
        ),
    }
}
