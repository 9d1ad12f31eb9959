// drive-scanner command line entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use drive_scanner::commands;
use drive_scanner::platform::SysinfoDriveSource;
use drive_scanner::utils::{get_os_version, log::init_logger};
use drive_scanner::ScannerOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "drive-scanner")]
#[command(about = "Detect storage drives being attached and detached")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the currently attached drives
    List {
        /// Print JSON instead of one line per drive
        #[arg(long)]
        json: bool,

        /// Include drives hosting the operating system
        #[arg(long)]
        include_system: bool,
    },

    /// Show a single drive, by device name or mount point
    Info {
        device: String,

        #[arg(long)]
        json: bool,
    },

    /// Watch for drives being added or removed until Ctrl-C
    Watch {
        /// Poll interval in milliseconds (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,

        /// JSON scanner options file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.verbose) {
        eprintln!("Logging disabled: {}", e);
    }
    info!("Running on {}", get_os_version());

    let source = Arc::new(SysinfoDriveSource::new());

    match cli.command {
        Commands::List { json, include_system } => {
            let drives = commands::list_disks(source.as_ref(), include_system).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&drives)?);
            } else {
                for drive in &drives {
                    println!("{}", commands::format_drive(drive));
                }
            }
        }
        Commands::Info { device, json } => {
            let drive = commands::get_disk_info(source.as_ref(), &device).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&drive)?);
            } else {
                println!("{}", commands::format_drive(&drive));
            }
        }
        Commands::Watch { interval, config, json } => {
            let mut options = match config {
                Some(path) => ScannerOptions::from_file(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => ScannerOptions::default(),
            };
            if let Some(ms) = interval {
                options = options.with_interval(Duration::from_millis(ms));
            }

            let scanner = commands::start_monitoring(source, options, json).await?;
            tokio::signal::ctrl_c().await?;
            commands::stop_monitoring(&scanner).await?;
        }
    }

    Ok(())
}
