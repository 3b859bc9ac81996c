//! SFStore CLI
//!
//! Command-line tools for SFStore storage files.
//!
//! # Commands
//!
//! - `create` - Create an empty storage file
//! - `list` - List record names and lengths
//! - `import` / `export` - Copy a record from or to a regular file
//! - `rename` / `delete` / `truncate` - Modify records
//! - `inspect` - Display storage statistics and layout
//! - `verify` - Check segment chains for corruption
//! - `defrag` - Rewrite the file without free segments

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SFStore command-line storage tools.
#[derive(Parser)]
#[command(name = "sfstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the storage file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty storage file
    Create,

    /// List records
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Copy a file into a record
    Import {
        /// Record name
        name: String,

        /// Source file
        source: PathBuf,

        /// Replace the record if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Copy a record into a file (stdout if omitted)
    Export {
        /// Record name
        name: String,

        /// Destination file
        destination: Option<PathBuf>,
    },

    /// Rename a record
    Rename {
        /// Current name
        from: String,

        /// New name
        to: String,
    },

    /// Delete a record
    Delete {
        /// Record name
        name: String,
    },

    /// Truncate a record
    Truncate {
        /// Record name
        name: String,

        /// New length in bytes
        length: u64,
    },

    /// Display storage statistics and layout
    Inspect {
        /// Show the segment chain of every record
        #[arg(short, long)]
        segments: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify storage integrity
    Verify {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite the storage without free segments
    Defrag {
        /// Transfer buffer size in bytes
        #[arg(short, long)]
        buffer_size: Option<usize>,
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

    if let Commands::Version = cli.command {
        println!("SFStore CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("SFStore Core v{}", sfstore_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Storage path required (--path)")?;
    match cli.command {
        Commands::Create => commands::create::run(&path)?,
        Commands::List { format } => commands::list::run(&path, &format)?,
        Commands::Import {
            name,
            source,
            force,
        } => commands::import::run(&path, &name, &source, force)?,
        Commands::Export { name, destination } => {
            commands::export::run(&path, &name, destination.as_deref())?;
        }
        Commands::Rename { from, to } => commands::manage::rename(&path, &from, &to)?,
        Commands::Delete { name } => commands::manage::delete(&path, &name)?,
        Commands::Truncate { name, length } => commands::manage::truncate(&path, &name, length)?,
        Commands::Inspect { segments, format } => commands::inspect::run(&path, segments, &format)?,
        Commands::Verify { format } => commands::verify::run(&path, &format)?,
        Commands::Defrag { buffer_size } => commands::defrag::run(&path, buffer_size)?,
        Commands::Version => {}
    }

    Ok(())
}
