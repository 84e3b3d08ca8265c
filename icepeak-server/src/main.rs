//! Icepeak server CLI
//!
//! Run with: `cargo run -p icepeak-server --bin icepeak -- --help`

use clap::Parser;
use icepeak_server::{init_logging, IcepeakServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    init_logging(&config.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_file = %config.data_file.display(),
        journaling = config.journaling_enabled(),
        auth = config.auth_enabled(),
        "starting icepeak"
    );

    let server = IcepeakServer::new(config)?;
    server.run().await.map_err(Into::into)
}
