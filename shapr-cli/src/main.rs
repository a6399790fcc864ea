//! Shapr CLI — collection code generation tool.
//!
//! Point it at a directory of `.shapr` DSL sources:
//!
//! ```bash
//! shapr generate --input collections --out src/generated
//! shapr schema --input collections
//! ```
//!
//! See `shapr --help` for all available commands and options.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "shapr",
    about = "Shapr collection code generator",
    version,
    after_help = "See https://github.com/firstsoft/shapr for full documentation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate entity/repository/controller source from collection DSL files
    Generate {
        /// A `.shapr` source file, or a directory of them
        #[arg(long, default_value = "collections")]
        input: PathBuf,

        /// Output directory for the generated Rust source
        #[arg(long, default_value = "src/generated")]
        out: PathBuf,
    },

    /// Print the client-facing schema JSON for the parsed collections
    Schema {
        /// A `.shapr` source file, or a directory of them
        #[arg(long, default_value = "collections")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { input, out } => commands::generate::run(&input, &out),
        Commands::Schema { input } => commands::schema::run(&input),
    };

    if let Err(error) = result {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}
