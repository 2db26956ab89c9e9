//! CLI frontend for the Fabula story engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fabula",
    about = "Fabula: play and check Lua-scripted stories",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a story interactively
    Play {
        /// Entry script identifier (e.g. "main" or "res://main.lua")
        entry: String,

        /// Directory the script root maps onto
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// JSON engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print events as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a story to the end, always taking the first available option
    Check {
        /// Entry script identifier
        entry: String,

        /// Directory the script root maps onto
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// JSON engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Give up after this many events
        #[arg(long, default_value = "1000")]
        max_steps: usize,
    },

    /// Print the canonical module path for an identifier
    Resolve {
        /// Module identifier
        id: String,

        /// Resolve relative to this calling file
        #[arg(short, long)]
        from: Option<String>,

        /// JSON engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Play {
            entry,
            dir,
            config,
            json,
        } => commands::play::run(&dir, &entry, config.as_deref(), json),
        Commands::Check {
            entry,
            dir,
            config,
            max_steps,
        } => commands::check::run(&dir, &entry, config.as_deref(), max_steps),
        Commands::Resolve { id, from, config } => {
            commands::resolve::run(&id, from.as_deref(), config.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
