use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use worldnotes::api::{self, SecurityConfig};
use worldnotes::client::{WorldNotesClient, DEFAULT_URL};
use worldnotes::config::ServerConfig;
use worldnotes::db::Database;
use worldnotes::models::WorldExport;

#[derive(Parser)]
#[command(name = "worldnotes")]
#[command(about = "Map annotations and mission progression tracking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WorldNotes HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "WORLDNOTES_HOST")]
        host: Option<String>,

        /// Port for HTTP API
        #[arg(short, long, env = "WORLDNOTES_PORT")]
        port: Option<u16>,

        /// SQLite database file
        #[arg(long, env = "WORLDNOTES_DB")]
        db: Option<PathBuf>,
    },
    /// Download a full export from a running server
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long, env = "WORLDNOTES_URL", default_value = DEFAULT_URL)]
        url: String,
    },
    /// Upload an export file to a running server
    Import {
        file: PathBuf,

        #[arg(long, env = "WORLDNOTES_URL", default_value = DEFAULT_URL)]
        url: String,
    },
    /// Print the progression report
    Progression {
        /// Restrict the report to one map
        #[arg(long)]
        map_id: Option<Uuid>,

        #[arg(long, env = "WORLDNOTES_URL", default_value = DEFAULT_URL)]
        url: String,
    },
    /// Check server status
    Status {
        #[arg(long, env = "WORLDNOTES_URL", default_value = DEFAULT_URL)]
        url: String,
    },
}

/// Logs go to stderr so that `export` can write JSON to stdout.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "worldnotes=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn client_for(url: String) -> WorldNotesClient {
    let api_key = std::env::var("WORLDNOTES_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    WorldNotesClient::new(url, api_key)
}

async fn serve(host: Option<String>, port: Option<u16>, db: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = ServerConfig::load();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if db.is_some() {
        config.database = db;
    }

    let path = config.database_path()?;
    let db = Database::open(path.clone())
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    db.migrate()?;

    let security = SecurityConfig::from_env();
    if security.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    let app = api::create_router_with_config(db, security);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("WorldNotes server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { host, port, db }) => serve(host, port, db).await?,
        Some(Commands::Export { out, url }) => {
            let export = client_for(url).export().await?;
            let json = serde_json::to_string_pretty(&export)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote export to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Some(Commands::Import { file, url }) => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let bundle: WorldExport =
                serde_json::from_str(&content).context("Import file is not a valid export")?;
            let response = client_for(url).import(&bundle).await?;
            println!("{}", serde_json::to_string_pretty(&response.imported)?);
        }
        Some(Commands::Progression { map_id, url }) => {
            let report = client_for(url).progression(map_id).await?;
            println!(
                "Missions:    {}/{} completed, {} unlocked ({}%)",
                report.missions.completed,
                report.missions.total,
                report.missions.unlocked,
                report.missions.progress
            );
            println!(
                "Annotations: {}/{} unlocked ({}%)",
                report.annotations.unlocked, report.annotations.total, report.annotations.progress
            );
            println!("Overall:     {}%", report.overall.progress);
        }
        Some(Commands::Status { url }) => {
            let client = client_for(url);
            match client.health().await {
                Ok(_) => println!("WorldNotes server is running at {}", client.base_url()),
                Err(e) => {
                    println!("WorldNotes server is not reachable at {}: {}", client.base_url(), e);
                    std::process::exit(1);
                }
            }
        }
        None => serve(None, None, None).await?,
    }

    Ok(())
}
