use std::path::PathBuf;

use clap::{Parser, Subcommand};
use visual_search::Result;
use visual_search::commands::{generate, read_image_file, search, serve};
use visual_search::config::{Config, get_config_dir, run_interactive_config, show_config};
use visual_search::embeddings::ImageSource;

#[derive(Parser)]
#[command(name = "visual-search")]
#[command(about = "Find visually similar products by image")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.visual-search)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the model server and search settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP search API
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Catalog file with precomputed embeddings
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Compute embeddings for every product in a catalog
    Generate {
        /// Catalog file to read products from
        #[arg(long)]
        input: Option<PathBuf>,
        /// Where to write the catalog with embeddings
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of images processed at the same time
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Run a single image query against the catalog
    Search {
        /// Local image file
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        file: Option<PathBuf>,
        /// Remote image URL or data URI
        #[arg(long)]
        url: Option<String>,
        /// Catalog file with precomputed embeddings
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    if let Commands::Config { show: false } = cli.command {
        run_interactive_config(&config_dir)?;
        return Ok(());
    }

    let mut config = Config::load_with_env(&config_dir)?;
    apply_cli_overrides(&mut config, &cli.command);
    config.validate()?;

    match cli.command {
        Commands::Config { .. } => {
            show_config(&config)?;
        }
        Commands::Serve { .. } => {
            serve(&config).await?;
        }
        Commands::Generate { .. } => {
            generate(&config).await?;
        }
        Commands::Search { file, url, .. } => {
            let source = match (file, url) {
                (Some(path), _) => read_image_file(&path)?,
                (None, url) => ImageSource::from_parts(None, url.as_deref())?,
            };
            search(&config, source).await?;
        }
    }

    Ok(())
}

/// Command-line flags take precedence over the file and the environment
fn apply_cli_overrides(config: &mut Config, command: &Commands) {
    match command {
        Commands::Serve { port, catalog } => {
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(catalog) = catalog {
                config.server.catalog_path.clone_from(catalog);
            }
        }
        Commands::Generate {
            input,
            output,
            concurrency,
        } => {
            if let Some(input) = input {
                config.generator.input_path.clone_from(input);
            }
            if let Some(output) = output {
                config.generator.output_path.clone_from(output);
            }
            if let Some(concurrency) = concurrency {
                config.generator.concurrency = *concurrency;
            }
        }
        Commands::Search { catalog, limit, .. } => {
            if let Some(catalog) = catalog {
                config.server.catalog_path.clone_from(catalog);
            }
            if let Some(limit) = limit {
                config.server.results_limit = *limit;
            }
        }
        Commands::Config { .. } => {}
    }
}
