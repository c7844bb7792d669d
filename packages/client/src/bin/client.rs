//! Headless drawing client with reconnection support.
//!
//! Joins a room on the relay, answers history requests from late joiners and
//! sends strokes typed at the prompt.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rakugaki-client -- --room 7
//! cargo run --bin rakugaki-client -- -r 7 --url ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;
use rakugaki_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "rakugaki-client")]
#[command(about = "Headless peer for the collaborative drawing relay", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long, allow_negative_numbers = true)]
    room: i64,

    /// WebSocket endpoint of the relay server
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = rakugaki_client::run_client(args.url, args.room).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
