//! Puncover CLI entry point

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "puncover")]
#[command(about = "Code size and stack usage analysis for embedded binaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Toolchain output to collect from. Producing these files is up to the build.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    /// `nm --size-sort -l` output
    #[arg(long)]
    pub sizes: Option<PathBuf>,

    /// `nm --size-sort -l -C` output, used for display names
    #[arg(long)]
    pub demangled_sizes: Option<PathBuf>,

    /// `objdump -dslw` output
    #[arg(long)]
    pub disassembly: Option<PathBuf>,

    /// GCC `.su` stack usage report (repeatable)
    #[arg(long)]
    pub stack_usage: Vec<PathBuf>,

    /// Collector config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a size and stack summary
    Report {
        #[command(flatten)]
        inputs: Inputs,

        /// Dump all symbols as JSON instead
        #[arg(long)]
        json: bool,

        /// Number of entries in each ranking
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Print the collapsed folder tree
    Tree {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Print the deepest call chain below a function
    Stack {
        #[command(flatten)]
        inputs: Inputs,

        /// Function name or hex address
        symbol: String,

        /// Follow callers instead of callees
        #[arg(long)]
        callers: bool,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "puncover={0},puncover_core={0},puncover_collector={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Report { inputs, json, top } => {
            let analysis = commands::collect(&inputs)?;
            if json {
                commands::dump_json(&analysis)
            } else {
                commands::report(&analysis, top);
                Ok(())
            }
        }
        Commands::Tree { inputs } => {
            let analysis = commands::collect(&inputs)?;
            print!("{}", analysis.tree().render_collapsed());
            Ok(())
        }
        Commands::Stack {
            inputs,
            symbol,
            callers,
        } => {
            let analysis = commands::collect(&inputs)?;
            commands::stack(&analysis, &symbol, callers)
        }
        Commands::Version => {
            println!("puncover v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
