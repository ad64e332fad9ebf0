//! FastEnet binary codec.
//!
//! FastEnet frames share a fixed 20-byte header; the body starts with a
//! command byte and carries the device address as length-prefixed ASCII
//! text:
//!
//! ```text
//! ┌────────────────┬─────────┬──────┬─────────┬──────────────┬──────────┬──────────┐
//! │ header         │ command │ ...  │ name    │ address text │ count    │ payload  │
//! │ 20 bytes       │ 1 byte  │      │ len N   │ N-1 bytes    │ u16 LE   │ (write)  │
//! │ [16] = body LE │ @20     │      │ @28     │ @31          │ @30+N    │ @32+N    │
//! └────────────────┴─────────┴──────┴─────────┴──────────────┴──────────┴──────────┘
//! ```
//!
//! The header's u16 at offset 16 is the body length, which is how the
//! session layer delimits frames. Responses echo the request's 20-byte
//! header with five bytes rewritten, then a fixed 10-byte sub-header whose
//! first byte answers the command (0x55 for read, 0x59 for write), then
//! the payload for reads. The count field is a byte count throughout.
//!
//! All multi-byte integers are Little Endian.

use crate::device::XgbDevice;
use crate::error::{Result, XgbError};

/// Fixed header length shared by requests and responses.
pub const HEADER_LEN: usize = 20;

/// Header offset of the u16 LE body length.
pub const BODY_LEN_OFFSET: usize = 16;

/// Request command byte: read.
pub const CMD_READ: u8 = 0x54;

/// Request command byte: write.
pub const CMD_WRITE: u8 = 0x58;

/// Response command byte: read.
pub const RESP_READ: u8 = 0x55;

/// Response command byte: write.
pub const RESP_WRITE: u8 = 0x59;

/// Body field offsets within a request frame (header included).
pub mod offsets {
    /// Command byte (first body byte).
    pub const COMMAND: usize = 20;
    /// Device-name length N. The field counts one byte more than the
    /// address text, which is N-1 bytes long; the element count follows
    /// the text directly.
    pub const NAME_LEN: usize = 28;
    /// Start of the ASCII device address text.
    pub const ADDRESS: usize = 31;
    /// Element count (u16 LE) relative to the name length: `30 + N`.
    pub const COUNT_BASE: usize = 30;
    /// Write payload start relative to the name length: `32 + N`.
    pub const PAYLOAD_BASE: usize = 32;
}

/// Header bytes rewritten in every response, marking it as answered by the
/// station.
const HEADER_PATCH: [(usize, u8); 5] = [(9, 0x11), (10, 0x01), (12, 0xA0), (13, 0x11), (18, 0x03)];

/// Sub-header tail shared by read and write responses; the leading byte is
/// the response command.
const SUB_HEADER_TAIL: [u8; 9] = [0x00, 0x14, 0x00, 0x08, 0x01, 0x00, 0x00, 0x01, 0x00];

/// Request kind, classified by the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Read,
    Write,
}

impl Command {
    /// Classify a request command byte. Anything other than 0x54/0x58 is a
    /// protocol violation; the session layer closes the connection on it.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            CMD_READ => Ok(Command::Read),
            CMD_WRITE => Ok(Command::Write),
            other => Err(XgbError::MalformedFrame(format!(
                "unsupported command byte 0x{other:02X}"
            ))),
        }
    }

    /// The byte that leads the response sub-header.
    pub fn response_byte(&self) -> u8 {
        match self {
            Command::Read => RESP_READ,
            Command::Write => RESP_WRITE,
        }
    }
}

/// A parsed request frame, borrowing from the raw bytes.
#[derive(Debug)]
pub struct FastEnetRequest<'a> {
    /// Read or write.
    pub command: Command,
    /// Device address text, e.g. `"%MW100"`.
    pub address: &'a str,
    /// Requested byte count (read) or written byte count (write).
    pub count: u16,
    /// Write payload; empty for reads.
    pub payload: &'a [u8],
    /// The request's 20-byte header, echoed into the response.
    header: &'a [u8],
}

impl<'a> FastEnetRequest<'a> {
    /// Parse a complete frame (header plus body).
    ///
    /// Every field access is length-checked; a frame too short for any
    /// field it needs fails with [`XgbError::MalformedFrame`].
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        need(frame, offsets::COMMAND + 1)?;
        let command = Command::from_byte(frame[offsets::COMMAND])?;

        need(frame, offsets::NAME_LEN + 1)?;
        let name_len = frame[offsets::NAME_LEN] as usize;
        if name_len < 2 {
            return Err(XgbError::MalformedFrame(format!(
                "device name length {name_len} too short"
            )));
        }

        let count_offset = offsets::COUNT_BASE + name_len;
        need(frame, count_offset + 2)?;
        let address = std::str::from_utf8(&frame[offsets::ADDRESS..offsets::ADDRESS + name_len - 1])
            .map_err(|_| XgbError::MalformedFrame("device address is not ASCII text".into()))?;
        let count = u16::from_le_bytes([frame[count_offset], frame[count_offset + 1]]);

        let payload = match command {
            Command::Read => &frame[0..0],
            Command::Write => {
                let start = offsets::PAYLOAD_BASE + name_len;
                need(frame, start + count as usize)?;
                &frame[start..start + count as usize]
            }
        };

        Ok(Self {
            command,
            address,
            count,
            payload,
            header: &frame[..HEADER_LEN],
        })
    }
}

fn need(frame: &[u8], len: usize) -> Result<()> {
    if frame.len() < len {
        return Err(XgbError::MalformedFrame(format!(
            "frame length {} below required {}",
            frame.len(),
            len
        )));
    }
    Ok(())
}

/// Process one complete frame against the device and build the response.
///
/// Failures (unsupported command byte, unknown area, out-of-range access,
/// malformed frame) abort the response entirely; the session layer reacts
/// by closing the connection.
pub fn process_request(device: &XgbDevice, frame: &[u8]) -> Result<Vec<u8>> {
    let request = FastEnetRequest::parse(frame)?;
    match request.command {
        Command::Read => {
            let data = device.read(request.address, request.count)?;
            Ok(build_response(request.header, Command::Read, Some(&data)))
        }
        Command::Write => {
            device.write(request.address, request.payload)?;
            Ok(build_response(request.header, Command::Write, None))
        }
    }
}

/// Assemble a response: echoed header with the patch bytes applied, the
/// 10-byte sub-header, and for reads a u16 LE length plus the payload.
///
/// The body length at offset 16 can only be written after the payload is
/// appended, so the buffer is built first and the length patched last.
fn build_response(header: &[u8], command: Command, payload: Option<&[u8]>) -> Vec<u8> {
    let payload_len = payload.map_or(0, |p| p.len() + 2);
    let mut response = Vec::with_capacity(HEADER_LEN + 10 + payload_len);

    response.extend_from_slice(header);
    for (index, value) in HEADER_PATCH {
        response[index] = value;
    }

    response.push(command.response_byte());
    response.extend_from_slice(&SUB_HEADER_TAIL);

    if let Some(data) = payload {
        response.extend_from_slice(&(data.len() as u16).to_le_bytes());
        response.extend_from_slice(data);
    }

    response[BODY_LEN_OFFSET] = (response.len() - HEADER_LEN) as u8;
    response
}
