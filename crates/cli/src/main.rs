//! UrbanCart CLI - catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed the catalog of a running storefront
//! uc-cli seed products
//!
//! # Seed from another file / server
//! uc-cli seed products --file seeds/products.yaml --base-url http://localhost:8080
//!
//! # Validate the seed file without sending anything
//! uc-cli seed products --dry-run
//! ```
//!
//! # Commands
//!
//! - `seed products` - Create catalog products from a YAML file

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "uc-cli")]
#[command(author, version, about = "UrbanCart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a running storefront with data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create catalog products
    Products {
        /// YAML file with the products to create
        #[arg(short, long, default_value = "seeds/products.yaml")]
        file: String,

        /// Storefront base URL
        #[arg(short, long, env = "STOREFRONT_BASE_URL", default_value = "http://localhost:8080")]
        base_url: String,

        /// Validate the file only
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load .env before parsing so env-backed arguments see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { target } => match target {
            SeedTarget::Products {
                file,
                base_url,
                dry_run,
            } => commands::seed::products(&file, &base_url, dry_run).await?,
        },
    }
    Ok(())
}
