use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "ashareadvisor")]
#[command(about = "A-share snapshot analysis CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the A-share spot snapshot, write the CSV, and store it
    Fetch {
        /// Also write a copy of the snapshot CSV into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip the SQLite ingestion step
        #[arg(long)]
        no_ingest: bool,
    },
    /// Ingest a snapshot CSV into SQLite
    Ingest {
        /// CSV to ingest (defaults to the configured snapshot path)
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print stored rows for one stock code
    Query {
        code: String,
    },
    /// Render the price and volume/change charts for one stock code
    Chart {
        code: String,
        /// Directory the SVG files are written into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Ask the local model for a buy/sell/hold suggestion
    Advise {
        code: String,
    },
    /// Start the dashboard server
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
    /// Show snapshot and database status
    Status,
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { output, no_ingest } => {
            commands::fetch::run(output, no_ingest).await;
        }
        Commands::Ingest { csv } => {
            commands::ingest::run(csv).await;
        }
        Commands::Query { code } => {
            commands::query::run(&code).await;
        }
        Commands::Chart { code, output } => {
            commands::chart::run(&code, output).await;
        }
        Commands::Advise { code } => {
            commands::advise::run(&code).await;
        }
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::Status => {
            commands::status::run().await;
        }
    }
}
