//! FastEnet TCP server.
//!
//! One task per accepted connection, each running a strictly sequential
//! cycle: receive a complete frame, process it against the shared device,
//! write the response, then read the next frame. Connections never overlap
//! their own frames; across connections everything runs in parallel on the
//! shared [`XgbDevice`].
//!
//! A connection is closed on the first protocol violation (unsupported
//! command byte, malformed or failed frame); other sessions and the
//! register memory are unaffected.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::FastEnetConfig;
use crate::device::XgbDevice;
use crate::error::{Result, XgbError};
use crate::framing::FastEnetFrameBuffer;
use crate::protocol::fast_enet;

/// Bounded wait for the rest of a frame once its first bytes arrived.
const FRAME_TIMEOUT: Duration = Duration::from_millis(5000);

/// The FastEnet listener bound to one shared device.
pub struct FastEnetServer {
    config: FastEnetConfig,
    device: Arc<XgbDevice>,
}

impl FastEnetServer {
    /// Create a server serving `device`.
    pub fn new(config: FastEnetConfig, device: Arc<XgbDevice>) -> Self {
        Self { config, device }
    }

    /// Bind and serve until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        let listener = TcpListener::bind(&addr).await?;

        info!("fastenet server listening on {}", addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!("client online: {}", peer);
                    let device = Arc::clone(&self.device);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, device).await {
                            warn!("client {} dropped: {}", peer, e);
                        } else {
                            info!("client offline: {}", peer);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Per-connection loop: frame, process, respond, repeat.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    device: Arc<XgbDevice>,
) -> Result<()> {
    let mut frames = FastEnetFrameBuffer::new();
    let mut buf = vec![0u8; 4 * 1024];

    loop {
        // Idle connections may wait forever for a new request, but once a
        // frame has started arriving the rest must follow promptly.
        let n = if frames.pending() == 0 {
            stream.read(&mut buf).await?
        } else {
            match timeout(FRAME_TIMEOUT, stream.read(&mut buf)).await {
                Ok(read) => read?,
                Err(_) => {
                    return Err(XgbError::MalformedFrame(
                        "timed out waiting for the rest of a frame".into(),
                    ));
                }
            }
        };
        if n == 0 {
            return Ok(());
        }

        for frame in frames.push(&buf[..n]) {
            debug!(peer = %peer, len = frame.len(), "frame received");
            let response = fast_enet::process_request(&device, &frame)?;
            stream.write_all(&response).await?;
        }
    }
}
