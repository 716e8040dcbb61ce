//! Waypost - lightweight service registry daemon

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waypost::{
    config::Args,
    kv::{KvStore, MemoryStore, RedisStore},
    server::{self, AppState},
    vocab::Vocabulary,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("waypost={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Waypost - Service Registry");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Entry TTL: {}s", args.entry_ttl_secs);
    info!("Report tolerance: {}", args.report_tolerance);
    info!("Vocabulary: {}", args.vocab_path);
    info!("======================================");

    // Load the closed service type / provider vocabulary once; everything
    // downstream receives it as an immutable Arc
    let vocab = match Vocabulary::load(&args.vocab_path) {
        Ok(v) => {
            info!(
                "Vocabulary loaded: {} service types, {} providers",
                v.type_count(),
                v.provider_count()
            );
            Arc::new(v)
        }
        Err(e) => {
            error!("Failed to load vocabulary from {}: {}", args.vocab_path, e);
            std::process::exit(1);
        }
    };

    // Connect the key-value backend
    let kv: Arc<dyn KvStore> = if args.dev_mode {
        warn!("Development mode enabled - using in-memory store, state will not survive restart");
        let store = Arc::new(MemoryStore::new());
        waypost::kv::memory::spawn_sweep_task(Arc::clone(&store));
        store
    } else {
        match RedisStore::connect(&args.redis_url).await {
            Ok(store) => {
                info!("Redis connected: {}", args.redis_url);
                Arc::new(store)
            }
            Err(e) => {
                error!("Redis connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = kv.ping().await {
        error!("Key-value backend ping failed: {}", e);
        std::process::exit(1);
    }

    // Create application state and run the server
    let state = Arc::new(AppState::new(args, kv, vocab));

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
