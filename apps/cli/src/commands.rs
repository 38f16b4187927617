//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use notesync_core::{ProgressReporter, SkipReason, SyncOptions, SyncReport, run_sync};
use notesync_notion::{NotionClient, NotionConfig};
use notesync_shared::{
    AppConfig, Note, NoteSyncError, config_file_path, init_config, load_config, load_config_from,
    resolve_credentials, validate_config,
};
use notesync_weread::{WereadClient, WereadConfig};
use tracing::info;

/// Characters of a highlight shown in per-note console lines.
const PREVIEW_CHARS: usize = 20;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notesync: copy reading highlights into a note database.
#[derive(Parser)]
#[command(
    name = "notesync",
    version,
    about = "Sync WeRead highlights into a Notion database, skipping notes already synced.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.notesync/notesync.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Copy every highlight not yet in the database.
    Sync {
        /// Notes requested per page.
        #[arg(long)]
        page_size: Option<u32>,

        /// Stop after this many pages.
        #[arg(long)]
        max_pages: Option<u32>,

        /// Check for duplicates but do not write anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notesync=info",
        1 => "notesync=debug",
        _ => "notesync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Sync {
            page_size,
            max_pages,
            dry_run,
        } => cmd_sync(config_path, page_size, max_pages, dry_run).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Apply command-line overrides on top of the file config.
fn apply_overrides(
    config: &mut AppConfig,
    page_size: Option<u32>,
    max_pages: Option<u32>,
    dry_run: bool,
) {
    if let Some(size) = page_size {
        config.sync.page_size = size;
    }
    if max_pages.is_some() {
        config.sync.max_pages = max_pages;
    }
    if dry_run {
        config.sync.dry_run = true;
    }
}

async fn cmd_sync(
    config_path: Option<&Path>,
    page_size: Option<u32>,
    max_pages: Option<u32>,
    dry_run: bool,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    apply_overrides(&mut config, page_size, max_pages, dry_run);
    validate_config(&config)?;

    // Credentials are checked before any request goes out.
    let creds = resolve_credentials(&config)?;

    let source = WereadClient::new(WereadConfig::from_app_config(&config, creds.weread_cookie)?)?;
    let destination = NotionClient::new(NotionConfig::from_app_config(
        &config,
        creds.notion_token,
        creds.notion_database_id,
    )?)?;
    let options = SyncOptions::from(&config);

    info!(
        page_size = options.page_size,
        dry_run = options.dry_run,
        "syncing highlights"
    );

    let reporter = CliProgress::new();
    let result = run_sync(&source, &destination, &options, &reporter).await;
    reporter.finish();
    let report = result?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &SyncReport) {
    println!();
    if report.dry_run {
        println!("  Dry run complete, {} notes would be added.", report.added);
    } else {
        println!("  Sync complete, {} notes added.", report.added);
    }
    println!("  Already synced: {}", report.skipped_existing);
    println!("  Empty:          {}", report.skipped_empty);
    if report.skipped_invalid > 0 {
        println!("  Without ID:     {}", report.skipped_invalid);
    }
    if report.failed > 0 {
        println!("  Failed:         {}", report.failed);
    }
    println!("  Pages:          {}", report.pages);
    println!("  Time:           {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a spinner plus one printed line per note.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner.set_message("Fetching highlights");
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn page_fetched(&self, offset: u32, count: usize) {
        self.spinner
            .set_message(format!("Processing notes {}-{}", offset + 1, offset as usize + count));
    }

    fn note_added(&self, note: &Note, dry_run: bool) {
        let verb = if dry_run { "Would add" } else { "Added" };
        self.spinner.println(format!(
            "  {verb}: 《{}》 - {}",
            note.book_name,
            preview(&note.content)
        ));
    }

    fn note_skipped(&self, note: &Note, reason: SkipReason) {
        match reason {
            SkipReason::AlreadySynced => self
                .spinner
                .println(format!("  Skipped existing: {}", preview(&note.content))),
            SkipReason::MissingId => self
                .spinner
                .println(format!("  Skipped, no note ID: {}", preview(&note.content))),
            SkipReason::EmptyContent => {}
        }
    }

    fn note_failed(&self, note: &Note, error: &NoteSyncError) {
        self.spinner.println(format!("  Failed {}: {error}", note.id));
    }

    // The spinner is cleared by `finish`, which also runs when the sync fails.
    fn done(&self, _report: &SyncReport) {}
}

/// First few characters of a highlight, for console lines.
fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let source = match config_path {
        Some(p) => p.display().to_string(),
        None => config_file_path()?.display().to_string(),
    };

    println!("# {source}");
    println!("{}", toml::to_string_pretty(&config)?);

    println!("# credentials");
    for name in [
        &config.weread.cookie_env,
        &config.notion.token_env,
        &config.notion.database_id_env,
    ] {
        let state = match std::env::var(name) {
            Ok(val) if !val.trim().is_empty() => "set",
            _ => "missing",
        };
        println!("# {name}: {state}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from([
            "notesync",
            "-v",
            "sync",
            "--page-size",
            "50",
            "--dry-run",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Sync {
                page_size,
                max_pages,
                dry_run,
            } => {
                assert_eq!(page_size, Some(50));
                assert_eq!(max_pages, None);
                assert!(dry_run);
            }
            Command::Config { .. } => panic!("expected sync"),
        }
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = AppConfig::default();
        config.sync.max_pages = Some(9);

        apply_overrides(&mut config, Some(5), None, true);
        assert_eq!(config.sync.page_size, 5);
        assert_eq!(config.sync.max_pages, Some(9));
        assert!(config.sync.dry_run);
    }

    #[test]
    fn spinner_is_cleared_only_by_finish() {
        let progress = CliProgress {
            spinner: ProgressBar::hidden(),
        };

        progress.done(&SyncReport::default());
        assert!(!progress.spinner.is_finished());

        progress.finish();
        assert!(progress.spinner.is_finished());
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("short"), "short");
        assert_eq!(
            preview("一二三四五六七八九十一二三四五六七八九十多"),
            "一二三四五六七八九十一二三四五六七八九十..."
        );
    }
}
