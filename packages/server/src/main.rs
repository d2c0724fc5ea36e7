//! AlignViz server binary
//!
//! ```bash
//! ALIGNVIZ_DATA_DIR=./data cargo run -p alignviz-server
//! ```
//!
//! See [`alignviz_server::config`] for the environment variables read at
//! startup. `RUST_LOG` controls logging (default `info`).

use alignviz_core::JsonDirectorySource;
use alignviz_server::{start_server, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let source = JsonDirectorySource::new(&config.data_dir);

    start_server(AppState::new(source), &config).await
}
