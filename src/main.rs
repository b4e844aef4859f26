//! Gridcalc - spreadsheet engine with automatic recalculation

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gridcalc::config::Config;
use gridcalc::server;
use gridcalc_core::{FileStore, MemoryStore, SheetStore, SpreadsheetServices, Updates};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gridcalc")]
#[command(version)]
#[command(about = "Spreadsheet engine with automatic recalculation")]
struct Cli {
    /// Config file (default: <config dir>/gridcalc/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one .grd file per spreadsheet
    #[arg(long, global = true, env = "GRIDCALC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keep spreadsheets in memory only
    #[arg(long, global = true, conflicts_with = "data_dir")]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Host address to bind to (use 0.0.0.0 for all interfaces)
        #[arg(short = 'H', long, env = "GRIDCALC_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "GRIDCALC_PORT")]
        port: Option<u16>,
    },
    /// Set a cell's formula and print every changed value
    Set {
        sheet: String,
        cell: String,
        #[arg(allow_hyphen_values = true)]
        expr: String,
    },
    /// Print a cell's formula and value
    Get { sheet: String, cell: String },
    /// Delete a cell
    Rm { sheet: String, cell: String },
    /// Copy the formula of SRC into DEST, adjusting relative references
    Copy {
        sheet: String,
        dest: String,
        src: String,
    },
    /// Print every formula of a spreadsheet
    Dump { sheet: String },
    /// Delete every cell of a spreadsheet
    Clear { sheet: String },
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(cli: &Cli, config: &Config) -> anyhow::Result<Arc<dyn SheetStore>> {
    if cli.memory {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir())
        .context("No data directory: pass --data-dir or set data_dir in the config file")?;
    let store = FileStore::open(&dir)
        .with_context(|| format!("Failed to open data directory {}", dir.display()))?;
    info!("Data directory: {}", store.dir().display());
    Ok(Arc::new(store))
}

fn print_updates(updates: &Updates) {
    for (id, value) in updates {
        println!("{} = {}", id, value);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    let services = SpreadsheetServices::new(open_store(&cli, &config)?);

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::run_server(Arc::new(services), &config.server))?;
        }
        Command::Set { sheet, cell, expr } => {
            print_updates(&services.evaluate(&sheet, &cell, &expr)?);
        }
        Command::Get { sheet, cell } => {
            let info = services.query(&sheet, &cell)?;
            println!("{} = {}", info.expr, info.value);
        }
        Command::Rm { sheet, cell } => {
            print_updates(&services.remove(&sheet, &cell)?);
        }
        Command::Copy { sheet, dest, src } => {
            print_updates(&services.copy(&sheet, &dest, &src)?);
        }
        Command::Dump { sheet } => {
            for (id, expr) in services.dump(&sheet)? {
                println!("{}: ={}", id, expr);
            }
        }
        Command::Clear { sheet } => {
            services.clear(&sheet)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let default_filter = match cli.command {
        Command::Serve { .. } => "gridcalc=info,gridcalc_core=info,tower_http=info",
        _ => "error",
    };
    init_tracing(default_filter);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
