mod cli;
mod color;
mod db;
mod error;
mod ledger;
mod stats;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli_opts = cli::Cli::parse();
    let filter = EnvFilter::try_new(&cli_opts.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = cli_opts.db.unwrap_or_else(db::default_db_path);
    let conn = db::init(&db_path)?;
    let mut ledger = ledger::Ledger::open(conn, ledger::StorageKeys::default())?;
    ledger.on_theme_change(|color| {
        tracing::debug!("accent color {color} ({})", color.hex());
    });

    let command = cli_opts
        .command
        .unwrap_or(cli::Command::Status { project: None });
    cli::run(command, &mut ledger)
}
