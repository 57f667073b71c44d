use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sapper_app::config::Config;
use sapper_app::session::Session;
use sapper_core::journal_file::JournalWriter;

const BUILD_ID: &str = env!("CARGO_PKG_VERSION");

/// Arena runner: reads one snapshot per stdin line and writes one command
/// token per stdout line. Logs go to stderr; stdout is the wire.
#[derive(Parser, Debug)]
#[command(name = "sapper", version, about)]
struct Args {
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Journal output path (JSONL); overrides the config file.
    #[arg(long)]
    journal: Option<PathBuf>,
    /// Log filter directive; overrides the config file and RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config = config.merge_cli(args.journal, args.log);

    let filter = match &config.log {
        Some(directive) => EnvFilter::try_new(directive).context("parsing log directive")?,
        None => EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let journal = match &config.journal {
        Some(path) => Some(
            JournalWriter::create(path, BUILD_ID)
                .with_context(|| format!("creating journal {}", path.display()))?,
        ),
        None => None,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(journal);
    session.run(stdin.lock(), stdout.lock())
}
