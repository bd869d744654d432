mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cloudsave")]
#[command(about = "Timestamped directory backups to multiple storage backends")]
#[command(version)]
struct Cli {
    /// Path to the CloudSave config directory (default: ~/.cloudsave)
    #[arg(long, global = true, env = "CLOUDSAVE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and key file
    Init,

    /// Store directories to every store target
    Store {
        /// Directories to store (default: the configured directories)
        directories: Vec<PathBuf>,
    },

    /// Restore the newest revision from the first restore source with data
    Restore,

    /// Delete all but the newest revisions on every store target
    Cleanup {
        /// Revisions to keep (default: revisions_to_keep from config)
        #[arg(long)]
        keep: Option<usize>,
    },

    /// List revisions on every backend
    List,

    /// Show current configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cloudsave=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => cloudsave_core::config::CloudSaveConfig::default_base_dir()?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => commands::init::run(&base_dir),
        Commands::Store { ref directories } => {
            rt.block_on(commands::store::run(directories, &base_dir))
        }
        Commands::Restore => rt.block_on(commands::restore::run(&base_dir)),
        Commands::Cleanup { keep } => rt.block_on(commands::cleanup::run(keep, &base_dir)),
        Commands::List => rt.block_on(commands::list::run(&base_dir)),
        Commands::Config => commands::config::run(&base_dir),
    }
}
