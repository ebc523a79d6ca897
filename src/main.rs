use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::{
    api,
    config::{ServerConfig, Storage},
    db::{self, Database},
};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Tasks, epics and subtasks with a conflict-checked schedule")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Task file to load and save
        #[arg(long, conflicts_with = "in_memory")]
        data_file: Option<PathBuf>,

        /// Keep everything in memory
        #[arg(long)]
        in_memory: bool,
    },
    /// Load a task file and report what it contains
    Check {
        /// Task file to check (defaults to the platform data file)
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskboard=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = config.open_database()?;
    match db.path() {
        Some(path) => tracing::info!("Using task file {}", path.display()),
        None => tracing::info!("Running without a task file"),
    }

    let app = api::create_router(db);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("taskboard listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

fn check(data_file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match data_file {
        Some(path) => path,
        None => db::default_data_file()?,
    };
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }

    let db = Database::open(path.clone())?;
    let (tasks, epics, subtasks, scheduled, history) = db.read(|m| {
        (
            m.list_tasks().len(),
            m.list_epics().len(),
            m.list_subtasks().len(),
            m.prioritized().len(),
            m.history_ids().len(),
        )
    });

    println!("{}: OK", path.display());
    println!("  tasks:     {}", tasks);
    println!("  epics:     {}", epics);
    println!("  subtasks:  {}", subtasks);
    println!("  scheduled: {}", scheduled);
    println!("  history:   {}", history);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            data_file,
            in_memory,
        }) => {
            let mut config = ServerConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if in_memory {
                config.storage = Storage::Memory;
            } else if let Some(path) = data_file {
                config.storage = Storage::File(path);
            }
            serve(config).await?;
        }
        Some(Commands::Check { data_file }) => check(data_file)?,
        None => serve(ServerConfig::from_env()).await?,
    }

    Ok(())
}
