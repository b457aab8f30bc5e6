use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use devcamper::logging::init_tracing;
use devcamper::state::connect_store;
use devcamper::utils::geocoder::geocoder_from_config;
use devcamper_cli::seeder::{self, Fixtures};
use devcamper_config::{GeocoderConfig, ServerConfig};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "devcamper-cli")]
#[command(about = "DevCamper CLI - Administrative tools for DevCamper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import or destroy fixture data
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
    /// Create an administrator account
    CreateAdmin {
        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Import users, bootcamps, courses and reviews from JSON fixtures
    Import {
        /// Directory holding users.json, bootcamps.json, courses.json, reviews.json
        #[arg(short = 'd', long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Delete every document from every collection
    Destroy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let server_config = ServerConfig::from_env().map_err(anyhow::Error::msg)?;
    let store = connect_store(&server_config.store).await?;

    match cli.command {
        Commands::Seed {
            action: SeedAction::Import { data_dir },
        } => {
            let fixtures = Fixtures::load(&data_dir)
                .with_context(|| format!("Failed to load fixtures from {}", data_dir.display()))?;
            let geocoder = geocoder_from_config(&GeocoderConfig::from_env());
            let summary = seeder::import(store.as_ref(), geocoder.as_ref(), fixtures).await?;
            println!(
                "✅ Data imported: {} users, {} bootcamps, {} courses, {} reviews",
                summary.users, summary.bootcamps, summary.courses, summary.reviews
            );
        }
        Commands::Seed {
            action: SeedAction::Destroy,
        } => {
            let removed = seeder::destroy(store.as_ref()).await?;
            println!("🗑️  Data destroyed: {removed} documents removed");
        }
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let name = match name {
                Some(name) => name,
                None => Input::<String>::new().with_prompt("Name").interact_text()?,
            };
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email address").interact_text()?,
            };
            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords don't match")
                    .interact()?,
            };

            let admin = seeder::create_admin(store.as_ref(), &name, &email, &password).await?;
            println!("\n✅ Admin created successfully!");
            println!("   Email: {}", admin.email);
            println!("   Name: {}", admin.name);
        }
    }
    Ok(())
}
