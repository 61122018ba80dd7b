use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use stockdata::cli::browse::BrowseOptions;
use stockdata::core::SortOrder;
use stockdata::core::log::init_logging;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP API
    Serve {
        /// Keep records in process memory instead of the hosted store
        #[arg(long)]
        memory: bool,
    },
    /// Import a JSON search-result export into the store
    Import {
        /// File to import
        file: PathBuf,
        /// Classification tag stored on every imported record
        #[arg(short, long)]
        data_type: String,
    },
    /// Browse stored records through the API
    Browse {
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort_by: Option<String>,
        /// asc or desc
        #[arg(long, default_value = "asc")]
        sort_order: String,
    },
}

impl From<Commands> for stockdata::AppCommand {
    fn from(cmd: Commands) -> stockdata::AppCommand {
        match cmd {
            Commands::Serve { memory } => stockdata::AppCommand::Serve { memory },
            Commands::Import { file, data_type } => {
                stockdata::AppCommand::Import { file, data_type }
            }
            Commands::Browse {
                page_size,
                search,
                sort_by,
                sort_order,
            } => stockdata::AppCommand::Browse(BrowseOptions {
                page_size: page_size.max(1),
                search,
                sort_by,
                sort_order: SortOrder::parse_lenient(Some(&sort_order)),
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve { .. }) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => stockdata::cli::setup::setup(),
        Some(cmd) => stockdata::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
