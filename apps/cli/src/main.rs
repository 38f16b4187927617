//! notesync CLI: copy WeRead highlights into a Notion database.
//!
//! Notes already present in the database (matched by note ID) are skipped,
//! so the command is safe to rerun.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env file is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
