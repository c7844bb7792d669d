//! Rakugaki drawing relay server.
//!
//! Peers connect to `/ws?r=<room>` and exchange drawing events with the other
//! peers in the same room. The browser client is served from `--static-dir`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rakugaki-server
//! cargo run --bin rakugaki-server -- --host 127.0.0.1 --port 3000
//! PORT=3000 STATIC_DIR=./web/public cargo run --bin rakugaki-server
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use rakugaki_server::{
    infrastructure::{broker::BrokerSpawner, registry::InMemoryRoomRegistry},
    ui::Server,
    usecase::{GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase},
};
use rakugaki_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "rakugaki-server")]
#[command(about = "Relay server for a collaborative drawing board", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Directory of static files served at `/`
    #[arg(long, env = "STATIC_DIR", default_value = "./web/public")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Registry
    // 2. Spawner
    // 3. UseCases
    // 4. Server

    // 1. Create Registry (in-memory room table)
    let registry = Arc::new(InMemoryRoomRegistry::new());

    // 2. Create Spawner (one broker task per room)
    let spawner = Arc::new(BrokerSpawner::new(registry.clone()));

    // 3. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(registry.clone(), spawner));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry));

    // 4. Create and run the server
    let server = Server::new(
        join_room_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        args.static_dir,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
