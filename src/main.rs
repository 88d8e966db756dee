use clap::{Parser, Subcommand};
use std::path::PathBuf;

use anime_recommender::Result;
use anime_recommender::commands::{build_index, recommend_once, run_ui};
use anime_recommender::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "anime-recommender")]
#[command(about = "Anime recommendations from a local vector index and a hosted language model")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml; relative data paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama and the language model
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Process the anime CSV and build the vector index
    Build {
        /// Raw CSV to process instead of the configured one
        #[arg(long)]
        input: Option<PathBuf>,
        /// Index directory to write instead of the configured one
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print recommendations for a single query
    Recommend {
        /// Free-text description of what you want to watch
        query: String,
    },
    /// Start the interactive terminal page (default)
    Ui,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_dir = cli.config_dir;

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Build { input, output } => {
            build_index(&config_dir, input.as_deref(), output.as_deref()).await?;
        }
        Commands::Recommend { query } => {
            recommend_once(&config_dir, &query).await?;
        }
        Commands::Ui => {
            run_ui(&config_dir).await?;
        }
    }

    Ok(())
}
