//! GRID gate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Build the ledger client
//! 3. Connect the post store (Redis, or in-memory when unset)
//! 4. Build router with API routes
//! 5. Apply CORS and API header middleware
//! 6. Start Axum server
//!
//! Also supports a `sign` subcommand that signs the challenge with a local key.

use grid_gate::{
    auth::{middleware::AppState, verify},
    config::Config,
    ledger::{Ledger, RpcLedger, RpcLedgerConfig},
    middleware::{api_headers, cors_layer},
    routes,
    storage::{MemoryPostStore, PostStore, RedisPostStore},
};
use std::error::Error;
use std::sync::Arc;

/// Sign `message` with a hex private key, returning (address, signature).
fn sign(private_key_hex: &str, message: &str) -> Result<(String, String), verify::SignError> {
    let key = verify::signing_key_from_hex(private_key_hex)?;
    let address = verify::address_of(key.verifying_key());
    let signature = verify::sign_message(&key, message)?;
    Ok((address.to_string(), signature))
}

fn print_sign_usage() {
    eprintln!("Usage: grid-gate sign <private-key-hex> [message]");
    eprintln!();
    eprintln!("Sign a login challenge the way a wallet's personal_sign does.");
    eprintln!("The message defaults to CHALLENGE_MESSAGE, or the built-in challenge.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  grid-gate sign 0xac09...ff80");
}

async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    tracing::info!("Starting grid-gate on {}", config.bind_addr);

    let ledger = RpcLedger::new(RpcLedgerConfig {
        rpc_url: config.ledger_rpc_url.clone(),
        membership_nft: config.membership_nft_address,
        proof_of_location: config.proof_of_location_address,
        backend_key: verify::signing_key_from_hex(&config.backend_wallet_key)?,
        timeout: config.ledger_timeout(),
    })?;
    tracing::info!(
        backend = %ledger.backend_address(),
        "Ledger client configured"
    );
    let ledger: Arc<dyn Ledger> = Arc::new(ledger);

    let posts: Arc<dyn PostStore> = match config.redis_url.as_deref() {
        Some(url) => {
            let store = RedisPostStore::connect(url).await?;
            tracing::info!("Connected to Redis post store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set; posts are kept in memory and lost on restart");
            Arc::new(MemoryPostStore::new())
        }
    };

    let cors = cors_layer(&config.cors_allowed_origins)?;
    let bind_addr = config.bind_addr;
    let max_body_bytes = config.max_body_bytes;
    let state = AppState::new(config, ledger, posts);

    let app = routes::api_router()
        .layer(axum::extract::DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(axum::middleware::from_fn(api_headers))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "sign" {
        if args.len() < 3 || args.len() > 4 {
            print_sign_usage();
            std::process::exit(1);
        }
        let _ = dotenvy::dotenv();
        let message = match args.get(3) {
            Some(message) => message.clone(),
            None => std::env::var("CHALLENGE_MESSAGE")
                .unwrap_or_else(|_| verify::DEFAULT_CHALLENGE_MESSAGE.to_string()),
        };

        match sign(&args[2], &message) {
            Ok((address, signature)) => {
                println!("address:   {}", address);
                println!("signature: {}", signature);
            }
            Err(e) => {
                eprintln!("Error signing message: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
