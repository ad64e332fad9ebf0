//! Frame delimitation for both transports.
//!
//! Sockets and serial ports deliver arbitrary byte chunks; the session
//! loops feed them into one of these buffers and get back complete frames.
//! Both buffers accumulate into a single `BytesMut` and hand out frames as
//! zero-copy `Bytes` splits.
//!
//! - [`FastEnetFrameBuffer`]: fixed 20-byte header whose u16 LE at offset
//!   16 is the body length.
//! - [`CnetFrameBuffer`]: ENQ-prefixed text up to ETX, plus the two
//!   trailing checksum characters.
//!
//! # Example
//!
//! ```ignore
//! let mut buffer = FastEnetFrameBuffer::new();
//! for frame in buffer.push(&chunk) {
//!     let response = fast_enet::process_request(&device, &frame)?;
//! }
//! ```

use bytes::{Bytes, BytesMut};

use crate::error::{Result, XgbError};
use crate::protocol::cnet::{CHECKSUM_LEN, ENQ, ETX, MIN_FRAME_LEN};
use crate::protocol::fast_enet::{BODY_LEN_OFFSET, HEADER_LEN};

/// Accumulates FastEnet bytes and extracts complete header+body frames.
pub struct FastEnetFrameBuffer {
    buffer: BytesMut,
}

impl FastEnetFrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Push data and extract every complete frame it finishes.
    ///
    /// Partial data stays buffered for the next push. The body length is a
    /// u16, so no length sanity error is possible here; malformed content
    /// is the codec's concern.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }
        frames
    }

    fn try_extract_one(&mut self) -> Option<Bytes> {
        if self.buffer.len() < HEADER_LEN {
            return None;
        }
        let body_len = u16::from_le_bytes([
            self.buffer[BODY_LEN_OFFSET],
            self.buffer[BODY_LEN_OFFSET + 1],
        ]) as usize;
        let total = HEADER_LEN + body_len;
        if self.buffer.len() < total {
            return None;
        }
        Some(self.buffer.split_to(total).freeze())
    }

    /// Number of buffered (incomplete) bytes.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for FastEnetFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper bound on a buffered Cnet frame; a frame that grows past this
/// without an ETX is a framing failure and resets the buffer.
pub const CNET_MAX_FRAME: usize = 1024;

/// Accumulates Cnet serial bytes and extracts ENQ..ETX+checksum frames.
pub struct CnetFrameBuffer {
    buffer: BytesMut,
}

impl CnetFrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(CNET_MAX_FRAME),
        }
    }

    /// Push data and extract every complete frame it finishes.
    ///
    /// Noise bytes before the ENQ are discarded (serial links glitch on
    /// open). An ETX-less frame past [`CNET_MAX_FRAME`] fails with
    /// [`XgbError::MalformedFrame`] and clears the buffer so the link can
    /// resynchronize.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        loop {
            self.discard_leading_noise();
            match self.try_extract_one() {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }

        if self.buffer.len() > CNET_MAX_FRAME {
            self.buffer.clear();
            return Err(XgbError::MalformedFrame(format!(
                "no ETX within {CNET_MAX_FRAME} bytes"
            )));
        }
        Ok(frames)
    }

    fn discard_leading_noise(&mut self) {
        match self.buffer.iter().position(|&b| b == ENQ) {
            Some(0) => {}
            Some(start) => {
                let _ = self.buffer.split_to(start);
            }
            None => self.buffer.clear(),
        }
    }

    fn try_extract_one(&mut self) -> Option<Bytes> {
        loop {
            let etx = self.buffer.iter().position(|&b| b == ETX)?;
            let total = etx + 1 + CHECKSUM_LEN;
            if self.buffer.len() < total {
                return None;
            }
            let frame = self.buffer.split_to(total).freeze();
            // Runts below the protocol minimum are line noise, not frames.
            if frame.len() >= MIN_FRAME_LEN {
                return Some(frame);
            }
        }
    }

    /// Number of buffered (incomplete) bytes.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for CnetFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
