use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::{health, seed, serve, SeedArgs, ServeArgs};
use utils::logging;

/// Inkpress CLI - Command line interface for the Inkpress CMS
#[derive(Parser)]
#[command(name = "inkp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Create the super admin account and demo content
    Seed(SeedArgs),

    /// Check a running server's health
    Health {
        /// Base URL of the server
        #[arg(long, env = "INKPRESS_URL", default_value = "http://localhost:3030")]
        url: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let log_dir = match &cli.command {
        Commands::Serve(args) => args.log_dir.clone(),
        _ => None,
    };
    let _guard = logging::init_logging(log_dir.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Serve(args) => {
            serve::execute(args).await?;
            logging::log_shutdown();
        }
        Commands::Seed(args) => {
            seed::execute(args).await?;
        }
        Commands::Health { url, format } => {
            health::execute(url, format).await?;
        }
    }

    Ok(())
}
