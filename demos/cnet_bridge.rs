//! Serve both protocols against one register memory.
//!
//! The FastEnet listener and the Cnet serial link share a single device,
//! so a TCP master sees the bytes a serial master writes and vice versa:
//!
//! ```bash
//! cargo run --example cnet_bridge -- /dev/ttyUSB0
//! ```

use std::sync::Arc;

use xgb_sim::{CnetConfig, CnetLink, FastEnetConfig, FastEnetServer, XgbDevice};

#[tokio::main]
async fn main() -> xgb_sim::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let device = Arc::new(XgbDevice::new());

    let server = FastEnetServer::new(FastEnetConfig::default(), Arc::clone(&device));
    let link = CnetLink::new(CnetConfig::for_path(path), device);

    tokio::select! {
        result = server.run() => result,
        result = link.run() => result,
    }
}
