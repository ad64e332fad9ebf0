//! Cnet serial link.
//!
//! A single task owns the port and runs the whole receive/dispatch/reply
//! cycle, so frame processing is naturally serialized: one request is fully
//! answered before the next frame is taken from the buffer. At most one
//! link is open per [`CnetLink`].
//!
//! Frames that fail to parse or execute are logged and dropped without a
//! reply; the master's timeout drives recovery.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info, warn};

use crate::config::CnetConfig;
use crate::device::XgbDevice;
use crate::error::Result;
use crate::framing::CnetFrameBuffer;
use crate::protocol::cnet;

/// The Cnet serial endpoint bound to one shared device.
pub struct CnetLink {
    config: CnetConfig,
    device: Arc<XgbDevice>,
}

impl CnetLink {
    /// Create a link serving `device`.
    pub fn new(config: CnetConfig, device: Arc<XgbDevice>) -> Self {
        Self { config, device }
    }

    /// Open the port and serve until it closes.
    pub async fn run(&self) -> Result<()> {
        let mut port = self.open_port()?;
        info!(
            "cnet link open on {} ({} baud)",
            self.config.path, self.config.baud_rate
        );

        let mut frames = CnetFrameBuffer::new();
        let mut buf = vec![0u8; 1024];

        loop {
            let n = port.read(&mut buf).await?;
            if n == 0 {
                info!("cnet port {} closed", self.config.path);
                return Ok(());
            }

            let extracted = match frames.push(&buf[..n]) {
                Ok(extracted) => extracted,
                Err(e) => {
                    // Buffer already reset; resynchronize on the next ENQ.
                    warn!("cnet framing error: {}", e);
                    continue;
                }
            };

            for frame in extracted {
                debug!(len = frame.len(), "cnet frame received");
                match cnet::process_frame(&self.device, &frame) {
                    Ok(response) => port.write_all(&response).await?,
                    Err(e) => warn!("cnet frame rejected: {}", e),
                }
            }
        }
    }

    fn open_port(&self) -> Result<SerialStream> {
        let data_bits = match self.config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        let parity = match self.config.parity.as_str() {
            "even" => Parity::Even,
            "odd" => Parity::Odd,
            _ => Parity::None,
        };
        let stop_bits = match self.config.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };

        let builder = tokio_serial::new(&self.config.path, self.config.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits);

        Ok(builder.open_native_async()?)
    }
}
