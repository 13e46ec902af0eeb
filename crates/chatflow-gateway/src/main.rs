use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use chatflow_core::ChatflowConfig;
use chatflow_flows::{Gazetteer, Services};
use chatflow_sessions::SessionRegistry;

mod console;

use console::Console;

/// Talk to the chatflow engine over stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "chatflow-gateway", version)]
struct Args {
    /// Config file (default: ~/.chatflow/chatflow.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Principal that lines without an `@<id>` prefix are sent as
    #[arg(short, long, default_value = "local")]
    principal: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatflow_gateway=info,chatflow_sessions=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // load config: --config > CHATFLOW_CONFIG env > ~/.chatflow/chatflow.toml
    let config_path = args.config.or_else(|| std::env::var("CHATFLOW_CONFIG").ok());
    let config = ChatflowConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ChatflowConfig::default()
    });
    info!(version = env!("CARGO_PKG_VERSION"), "starting chatflow gateway");

    let registry = Arc::new(SessionRegistry::new());
    let gazetteer = Gazetteer::from(config.places.as_slice());
    info!(places = gazetteer.len(), "gazetteer loaded");
    let services = Services::new(Arc::clone(&registry), &config.engine, Arc::new(gazetteer));

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    if Path::new(&db_path).exists() {
        let restorer = Arc::clone(&services);
        registry.load_sessions(&db_path, |id, data| restorer.restore(id, data))?;
    }
    services.seed_admins(&config.admins);

    let dispatcher = Arc::new(services.dispatcher(config.bootstrap.clone()));
    let mut console = Console::new(args.principal);
    info!(principal = %console.current(), sessions = registry.len(), "reading messages from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(message) = console.read_line(&line) else {
            continue;
        };
        let dispatcher = Arc::clone(&dispatcher);
        let reply = tokio::task::spawn_blocking(move || dispatcher.handle(&message)).await?;
        println!("[{}] {}", console.current(), reply);
    }

    let saved = registry.save_sessions(&db_path)?;
    info!(path = %db_path, saved, "sessions saved, shutting down");
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = Path::new(path).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(error = %e, dir = %parent.display(), "could not create database directory");
        }
    }
}
