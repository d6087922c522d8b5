//! Schema migration tool.
//!
//! Builds the persistence context through the design-time factory, so it reads the
//! same `appsettings*.json` files and `ECOMMERCE_*` variables as the application.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use ecommerce_persistence::{DesignTimeContextFactory, EcommerceContextFactory, MigrationStatus};

#[derive(Parser)]
#[command(version, about = "Apply and inspect database migrations", long_about = None)]
#[command(name = "ecommerce-migrator")]
struct Cli {
    /// Directory holding appsettings.json (defaults to the executable's directory).
    #[arg(long, global = true)]
    base_path: Option<PathBuf>,

    /// Environment name, selects appsettings.<ENV>.json.
    #[arg(long, global = true)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations.
    Up,
    /// List migrations and whether they are applied.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration and database connectivity.
    Check,
}

impl Cli {
    fn factory(&self) -> EcommerceContextFactory {
        match &self.base_path {
            Some(path) => EcommerceContextFactory::new().with_base_path(path),
            None => EcommerceContextFactory::new(),
        }
    }

    /// Arguments handed to the design-time factory.
    fn design_time_args(&self) -> Vec<String> {
        match &self.environment {
            Some(environment) => vec!["--environment".to_string(), environment.clone()],
            None => Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let factory = cli.factory();
    let args = cli.design_time_args();

    // Logging is configured from the settings before the context is created.
    let settings = factory
        .load_settings(&args)
        .context("failed to load settings")?;
    ecommerce_observability::init_with(&settings.logging);

    let context = factory
        .create_context(&args)
        .context("failed to create database context")?;

    match cli.command {
        Command::Up => {
            context.migrate().await.context("migration failed")?;
            let status = context.migration_status().await?;
            let applied = status.iter().filter(|m| m.applied).count();
            info!(applied, known = status.len(), "migrations complete");
            println!("{applied} of {} migration(s) applied", status.len());
        }
        Command::Status { json } => {
            let status = context.migration_status().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print!("{}", render_status(&status));
            }
        }
        Command::Check => {
            context
                .ping()
                .await
                .context("database is not reachable")?;
            println!("configuration ok, database reachable");
        }
    }

    Ok(())
}

fn render_status(status: &[MigrationStatus]) -> String {
    if status.is_empty() {
        return "no migrations\n".to_string();
    }

    status
        .iter()
        .map(|m| {
            let state = if m.applied { "applied" } else { "pending" };
            format!("{:<16} {:<8} {}\n", m.version, state, m.description)
        })
        .collect()
}
