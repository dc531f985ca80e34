//! CLI tool for cmfkit archive operations.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// CMF game archive tool
#[derive(Parser)]
#[command(name = "cmfkit")]
#[command(author, version, about = "CMF game archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every entry (alias: x)
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show slot offsets and sizes
        #[arg(long)]
        technical: bool,
    },

    /// Show archive information (alias: i)
    #[command(alias = "i")]
    Info {
        /// Archive file to inspect
        archive: PathBuf,
    },

    /// Replace the content of one entry (alias: r)
    ///
    /// The new content must fit in the entry's existing slot.
    #[command(alias = "r")]
    Replace {
        /// Archive file to patch
        archive: PathBuf,

        /// Entry path (or table index) to replace
        entry: String,

        /// File holding the new content
        file: PathBuf,

        /// Write a patched copy here instead of patching in place
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Compression level (0-9) for compressed entries
        #[arg(short = 'l', long, default_value = "6")]
        level: u32,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Extract { archive, output } => {
            commands::extract(&archive, &output, cli.format, cli.quiet)
        }

        Commands::List { archive, technical } => commands::list(&archive, technical, cli.format),

        Commands::Info { archive } => commands::info(&archive, cli.format),

        Commands::Replace {
            archive,
            entry,
            file,
            output,
            level,
        } => commands::replace(&commands::ReplaceConfig {
            archive_path: &archive,
            entry: &entry,
            file: &file,
            output: output.as_deref(),
            level,
            format: cli.format,
        }),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
