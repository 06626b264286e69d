// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use polaroid::config::Config;
use polaroid::constants::storage;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "polaroid")]
#[command(about = "Camera and gallery polaroid screen")]
#[command(version = polaroid::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive screen in the terminal (default)
    Terminal,

    /// Take a photo with the virtual camera
    Snap {
        /// Use the front camera
        #[arg(short, long)]
        front: bool,

        /// Save the photo to the media library
        #[arg(short, long)]
        save: bool,
    },

    /// Show the configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        write_default: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Terminal));

    init_logging(interactive);

    let config = Config::load()?;

    match cli.command {
        None | Some(Commands::Terminal) => polaroid::terminal::run(config),
        Some(Commands::Snap { front, save }) => cli::snap(config, front, save),
        Some(Commands::Config { write_default }) => cli::show_config(&config, write_default),
    }
}

/// Set RUST_LOG to control the log level (e.g. RUST_LOG=polaroid=debug).
///
/// The interactive screen owns the terminal, so its logs go to a file in
/// the cache directory instead of stderr.
fn init_logging(interactive: bool) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    if interactive {
        let log_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(storage::APP_DIR_NAME);
        match open_log_file(&log_dir) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .init(),
            // stderr is about to be taken over by the screen, say it once up front
            Err(e) => eprintln!(
                "polaroid: logging disabled, cannot create log file in {}: {}",
                log_dir.display(),
                e
            ),
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(true)
        .with_level(true)
        .init();
}

fn open_log_file(dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(dir)?;
    File::create(dir.join(storage::LOG_FILE_NAME))
}
