//! crmlink CLI
//!
//! Offline tools for crmlink data files and queries.
//!
//! # Commands
//!
//! - `fetch` - Compile a conditions document into query markup
//! - `convert` - Re-serialize a table file into another format
//! - `inspect` - Display table statistics
//! - `name` - Encode or decode markup element names

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// crmlink command-line tools.
#[derive(Parser)]
#[command(name = "crmlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a conditions document into query markup
    Fetch {
        /// Entity logical name
        entity: String,

        /// Conditions as inline JSON
        #[arg(short, long, conflicts_with = "file")]
        conditions: Option<String>,

        /// File holding the conditions JSON
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Comma-separated columns (default: all)
        #[arg(long)]
        columns: Option<String>,
    },

    /// Re-serialize a table file into another format
    Convert {
        /// Source file
        input: PathBuf,

        /// Destination file; the extension picks the format
        output: PathBuf,

        /// Rename the table
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Display table statistics
    Inspect {
        /// Table file
        input: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Encode or decode a markup element name
    Name {
        /// Name to convert
        text: String,

        /// Decode instead of encode
        #[arg(short, long)]
        decode: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            entity,
            conditions,
            file,
            columns,
        } => {
            let conditions = match (conditions, file) {
                (Some(text), _) => Some(text),
                (None, Some(path)) => Some(std::fs::read_to_string(path)?),
                (None, None) => None,
            };
            let markup = commands::fetch::run(&entity, conditions.as_deref(), columns.as_deref())?;
            println!("{markup}");
        }
        Commands::Convert {
            input,
            output,
            name,
        } => {
            commands::convert::run(&input, &output, name)?;
        }
        Commands::Inspect { input, format } => {
            commands::inspect::run(&input, &format)?;
        }
        Commands::Name { text, decode } => {
            println!("{}", commands::name::run(&text, decode));
        }
        Commands::Version => {
            println!("crmlink CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("crmlink core v{}", crmlink_core::VERSION);
        }
    }

    Ok(())
}
