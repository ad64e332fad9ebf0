//! # xgb-sim
//!
//! A virtual LSIS XGB PLC. The crate emulates one unit's register memory
//! and answers the two wire protocols real masters speak:
//!
//! - **FastEnet** (binary, TCP): fixed 20-byte header frames
//! - **Cnet** (ASCII, serial): ENQ/ETX frames with hex-ASCII payloads and
//!   a modulo-256 checksum
//!
//! ## Architecture
//!
//! ```text
//! TcpListener ──▶ FastEnetFrameBuffer ──▶ fast_enet codec ─┐
//!                                                          ├─▶ XgbDevice ─▶ RegisterStore
//! SerialStream ─▶ CnetFrameBuffer ─────▶ cnet codec ───────┘      (P / Q / M / D)
//! ```
//!
//! Transports deliver raw bytes; the framing buffers cut them into complete
//! frames; the codecs parse, resolve addresses, touch the store, and build
//! the response bytes. All I/O stays in the session loops.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xgb_sim::{FastEnetConfig, FastEnetServer, XgbDevice};
//!
//! #[tokio::main]
//! async fn main() -> xgb_sim::Result<()> {
//!     let device = Arc::new(XgbDevice::new());
//!     device.write("%MW100", &[0x12, 0x34])?;
//!
//!     FastEnetServer::new(FastEnetConfig::default(), device).run().await
//! }
//! ```

pub mod address;
pub mod config;
pub mod device;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod serial;
pub mod server;
pub mod store;

pub use config::{CnetConfig, FastEnetConfig};
pub use device::XgbDevice;
pub use error::{Result, XgbError};
pub use serial::CnetLink;
pub use server::FastEnetServer;
pub use store::{MemoryArea, RegisterStore};
