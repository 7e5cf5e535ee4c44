//! Signaling server binary entry point
//!
//! Runs the room signaling relay.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address (0.0.0.0:3000)
//! cargo run --bin signaling_server
//!
//! # Custom bind address
//! cargo run --bin signaling_server -- --bind-addr 127.0.0.1:8080
//! ```

use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voiceroom::{ServerConfig, SignalingServer};

/// Voiceroom signaling server
///
/// WebSocket relay for room membership and offer/answer negotiation.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[arg(long, default_value = "0.0.0.0:3000", env = "VOICEROOM_BIND_ADDR")]
    bind_addr: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_handler = Arc::clone(&shutdown_flag);

    ctrlc::set_handler(move || {
        let was_already_set = shutdown_flag_handler.swap(true, Ordering::SeqCst);
        if was_already_set {
            eprintln!("Shutdown already in progress, forcing immediate exit");
            std::process::exit(0);
        }
        eprintln!("\nCtrl+C received, shutting down...");
    })
    .expect("Failed to set Ctrl+C handler");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("signaling-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args, shutdown_flag))
}

async fn async_main(
    args: Args,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!(
        version = voiceroom::VERSION,
        bind_addr = %args.bind_addr,
        "Voiceroom signaling server starting"
    );

    let config = ServerConfig {
        bind_addr: args.bind_addr,
    };

    let server = SignalingServer::bind(&config).await?;
    let handle = server.start();

    info!("Server running. Press Ctrl+C to shutdown.");

    while !shutdown_flag.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    info!("Shutdown signal received, cleaning up...");
    handle.shutdown().await;
    info!("Signaling server shut down gracefully");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
