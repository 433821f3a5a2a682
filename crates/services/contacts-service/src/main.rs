//! Contacts Service - store maintenance and inspection CLI.

use clap::{Parser, Subcommand};
use tracing::{info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contacts_service_lib::config::ContactsServiceConfig;
use contacts_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "contacts-service")]
#[command(about = "Contacts and groups backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Check that the configured store is reachable
    Ping,
    /// Print the groups owned by a user as JSON
    Groups {
        #[arg(long)]
        user: String,
        /// Space separated fields to keep, or `-field` entries to drop
        #[arg(long)]
        fields: Option<String>,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let config = ContactsServiceConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.service.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let span = info_span!("service", name = %config.service.service_name);

    run(cli.command, &config).instrument(span).await
}

async fn run(
    command: Commands,
    config: &ContactsServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            contacts_service_lib::run_migrations(migrate_action).await?;
        }
        Commands::Ping => {
            let services = contacts_service_lib::connect(config).await?;
            services.store().connection().ping().await?;
            println!("ok");
            services.shutdown().await?;
        }
        Commands::Groups { user, fields } => {
            let services = contacts_service_lib::connect(config).await?;
            let groups =
                contacts_service_lib::user_groups(&services, &user, fields.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&groups)?);
            services.shutdown().await?;
        }
    }

    Ok(())
}
