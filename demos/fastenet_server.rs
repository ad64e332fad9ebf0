//! Minimal FastEnet server.
//!
//! Binds the default port (2004), preloads a few registers, and serves
//! until killed. Point any XGB FastEnet master at it:
//!
//! ```bash
//! cargo run --example fastenet_server
//! RUST_LOG=debug cargo run --example fastenet_server
//! ```

use std::sync::Arc;

use xgb_sim::{FastEnetConfig, FastEnetServer, XgbDevice};

#[tokio::main]
async fn main() -> xgb_sim::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let device = Arc::new(XgbDevice::new());
    device.write("%MW0", &[0x12, 0x34, 0x56, 0x78])?;
    device.write("%DB100", b"hello")?;

    FastEnetServer::new(FastEnetConfig::default(), device)
        .run()
        .await
}
