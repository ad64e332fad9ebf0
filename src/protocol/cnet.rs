//! Cnet ASCII codec.
//!
//! Cnet is the character-oriented serial protocol: ENQ-framed commands with
//! hex-ASCII payloads and a trailing modulo-256 checksum.
//!
//! ```text
//! request:  ENQ  station  command  name-len  address   size  [payload]  checksum
//!           0x06 2 dec    3 chars  2 dec     name-len  2 hex            2 hex
//! response: ENQ  station  'r' 'S' 'B' '0' '1'  len   payload-hex  ETX  checksum
//! ```
//!
//! The 2 checksum characters of an incoming frame are stripped before
//! interpretation and are not verified, matching station behavior; outgoing
//! read responses always carry one (the sum of every preceding byte, ENQ
//! through ETX, modulo 256). Write responses are the short
//! `ENQ station 'wSB' ETX` acknowledgment with no checksum.
//!
//! The decoded device address classifies the access by its second and third
//! characters: `MB`/`PB` read bits, `DB`/`TB` read bytes, `MX` writes one
//! bit, `DW` writes words. `DD` and `DL` are recognized but unserved and
//! surface as [`XgbError::Unimplemented`].

use crate::address::resolve_letter_or_digit;
use crate::device::XgbDevice;
use crate::error::{Result, XgbError};
use crate::protocol::ascii;
use crate::store::MemoryArea;

/// Start-of-frame control byte.
pub const ENQ: u8 = 0x06;

/// End-of-text control byte.
pub const ETX: u8 = 0x03;

/// Trailing checksum characters on every incoming frame.
pub const CHECKSUM_LEN: usize = 2;

/// Shortest frame the link will dispatch.
pub const MIN_FRAME_LEN: usize = 5;

/// Field offsets within a frame (checksum already stripped).
mod field {
    /// Station id, 2 ASCII-decimal characters.
    pub const STATION: usize = 1;
    /// Command token, 3 characters.
    pub const COMMAND: usize = 3;
    /// Device-name length, 2 ASCII-decimal characters.
    pub const NAME_LEN: usize = 6;
    /// Device address text.
    pub const NAME: usize = 8;
    /// `WSS` writes shift the name fields by the extra block-count pair.
    pub const WSS_NAME_LEN: usize = 8;
    pub const WSS_NAME: usize = 10;
    /// Width of the size field, ASCII-hex characters.
    pub const SIZE_LEN: usize = 2;
}

/// Process one complete frame (ENQ through checksum) against the device and
/// build the response bytes.
///
/// Failures drop the frame: the codec returns the error and the link logs
/// it without replying, leaving recovery to the master's timeout.
pub fn process_frame(device: &XgbDevice, frame: &[u8]) -> Result<Vec<u8>> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(XgbError::MalformedFrame(format!(
            "serial frame length {} below minimum {MIN_FRAME_LEN}",
            frame.len()
        )));
    }
    // Checksum characters are stripped, not verified.
    let body = &frame[..frame.len() - CHECKSUM_LEN];
    if body[0] != ENQ {
        return Err(XgbError::MalformedFrame("frame does not start with ENQ".into()));
    }

    let station = decimal_field(body, field::STATION, 2)? as u8;
    let command = text_field(body, field::COMMAND, 3)?;

    if command.starts_with("rS") {
        process_read(device, body, station)
    } else if command.starts_with("wS") || command.starts_with("WS") {
        process_write(device, body, station, command == "WSS")
    } else {
        Err(XgbError::MalformedFrame(format!(
            "unknown command token {command:?}"
        )))
    }
}

fn process_read(device: &XgbDevice, body: &[u8], station: u8) -> Result<Vec<u8>> {
    let name_len = decimal_field(body, field::NAME_LEN, 2)?;
    let address = text_field(body, field::NAME, name_len)?;
    let size = hex_field(body, field::NAME + name_len, field::SIZE_LEN)?;

    let (class, start_token) = split_address(address)?;
    let data = match class {
        // Bit-oriented: the size field counts bytes, eight bits each, and
        // the start token may be a letter index.
        "MB" | "PB" => {
            let area = MemoryArea::from_letter(char::from(address.as_bytes()[1]))?;
            let start_bit = resolve_letter_or_digit(start_token)?;
            let bits = device.store().read_bits(area, start_bit, size * 8)?;
            ascii::pack_bits(&bits)
        }
        // Byte-oriented: the size field is the byte count and the start
        // token is plain decimal (letter indices are a bit-address
        // convention only). `TB` is recognized but `T` is not a served
        // area, so it always fails the area dispatch.
        "DB" | "TB" => {
            let area = MemoryArea::from_letter(char::from(address.as_bytes()[1]))?;
            let start = start_token
                .parse::<usize>()
                .map_err(|_| XgbError::InvalidAddress(address.to_string()))?;
            device.store().read_bytes(area, start, size)?
        }
        other => {
            return Err(XgbError::Unimplemented(format!("read class {other:?}")));
        }
    };

    Ok(build_read_response(station, &data))
}

fn process_write(device: &XgbDevice, body: &[u8], station: u8, is_wss: bool) -> Result<Vec<u8>> {
    let (name_len_offset, name_offset) = if is_wss {
        (field::WSS_NAME_LEN, field::WSS_NAME)
    } else {
        (field::NAME_LEN, field::NAME)
    };
    let name_len = decimal_field(body, name_len_offset, 2)?;
    let address = text_field(body, name_offset, name_len)?;
    let (class, start_token) = split_address(address)?;
    let start = resolve_letter_or_digit(start_token)?;

    // WSS carries a single 2-character value right after the address; the
    // generic form has a size field there and the payload after it.
    let value_offset = if is_wss {
        name_offset + name_len
    } else {
        name_offset + name_len + field::SIZE_LEN
    };

    match class {
        "MX" => {
            let area = match address.as_bytes()[1] {
                b'M' => MemoryArea::M,
                b'D' => MemoryArea::D,
                other => return Err(XgbError::UnsupportedArea(char::from(other))),
            };
            let value = text_field(body, value_offset, 2)?;
            device.store().write_bit(area, start, value == "01")?;
        }
        "DW" => {
            let area = match address.as_bytes()[1] {
                b'C' => MemoryArea::P,
                b'T' => MemoryArea::Q,
                b'M' => MemoryArea::M,
                b'D' => MemoryArea::D,
                other => return Err(XgbError::UnsupportedArea(char::from(other))),
            };
            let data = if is_wss {
                ascii::ascii_hex_to_bytes(bytes_field(body, value_offset, 2)?)?
            } else {
                let size = hex_field(body, name_offset + name_len, field::SIZE_LEN)?;
                ascii::ascii_hex_to_bytes(bytes_field(body, value_offset, size * 2)?)?
            };
            device.store().write_bytes(area, start, &data)?;
        }
        "DD" => {
            return Err(XgbError::Unimplemented("DD (double word) write".into()));
        }
        "DL" => {
            return Err(XgbError::Unimplemented("DL (long word) write".into()));
        }
        other => {
            return Err(XgbError::Unimplemented(format!("write class {other:?}")));
        }
    }

    Ok(build_write_response(station))
}

/// `ENQ station 'r' 'S' 'B' '0' '1' len payload ETX checksum`, with the
/// length and payload hex-ASCII expanded and the checksum summing every
/// byte emitted before it.
fn build_read_response(station: u8, data: &[u8]) -> Vec<u8> {
    let mut response = Vec::with_capacity(10 + data.len() * 2);
    response.push(ENQ);
    response.extend_from_slice(&ascii::byte_to_ascii_hex(station));
    response.extend_from_slice(b"rSB01");
    response.extend_from_slice(&ascii::byte_to_ascii_hex(data.len() as u8));
    response.extend_from_slice(&ascii::bytes_to_ascii_hex(data));
    response.push(ETX);
    response.extend_from_slice(&ascii::byte_to_ascii_hex(checksum(&response)));
    response
}

/// The short write acknowledgment: `ENQ station 'w' 'S' 'B' ETX`.
fn build_write_response(station: u8) -> Vec<u8> {
    let mut response = Vec::with_capacity(7);
    response.push(ENQ);
    response.extend_from_slice(&ascii::byte_to_ascii_hex(station));
    response.extend_from_slice(b"wSB");
    response.push(ETX);
    response
}

/// Modulo-256 sum of the frame bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Split a decoded address into its class characters (positions 1-2) and
/// the start token after them (position 3 onward).
fn split_address(address: &str) -> Result<(&str, &str)> {
    if address.len() < 4 || !address.is_ascii() {
        return Err(XgbError::InvalidAddress(address.to_string()));
    }
    Ok((&address[1..3], &address[3..]))
}

fn bytes_field(body: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    body.get(offset..offset + len).ok_or_else(|| {
        XgbError::MalformedFrame(format!(
            "frame length {} below field at {}..{}",
            body.len(),
            offset,
            offset + len
        ))
    })
}

fn text_field(body: &[u8], offset: usize, len: usize) -> Result<&str> {
    std::str::from_utf8(bytes_field(body, offset, len)?)
        .map_err(|_| XgbError::MalformedFrame("field is not ASCII text".into()))
}

fn decimal_field(body: &[u8], offset: usize, len: usize) -> Result<usize> {
    let text = text_field(body, offset, len)?;
    text.parse::<usize>()
        .map_err(|_| XgbError::MalformedFrame(format!("expected decimal digits, got {text:?}")))
}

fn hex_field(body: &[u8], offset: usize, len: usize) -> Result<usize> {
    let text = text_field(body, offset, len)?;
    usize::from_str_radix(text, 16)
        .map_err(|_| XgbError::MalformedFrame(format!("expected hex digits, got {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Terminate a request the way a master does: ETX, then the checksum
    /// characters. The checksum is real even though the codec does not
    /// verify it (open question preserved from the station firmware).
    fn seal(mut frame: Vec<u8>) -> Vec<u8> {
        frame.push(ETX);
        let sum = checksum(&frame);
        frame.extend_from_slice(&ascii::byte_to_ascii_hex(sum));
        frame
    }

    fn make_read(station: &str, address: &str, size: u8) -> Vec<u8> {
        let mut frame = vec![ENQ];
        frame.extend_from_slice(station.as_bytes());
        frame.extend_from_slice(b"rSB");
        frame.extend_from_slice(format!("{:02}", address.len()).as_bytes());
        frame.extend_from_slice(address.as_bytes());
        frame.extend_from_slice(&ascii::byte_to_ascii_hex(size));
        seal(frame)
    }

    fn make_write(station: &str, address: &str, size: u8, payload_hex: &[u8]) -> Vec<u8> {
        let mut frame = vec![ENQ];
        frame.extend_from_slice(station.as_bytes());
        frame.extend_from_slice(b"wSB");
        frame.extend_from_slice(format!("{:02}", address.len()).as_bytes());
        frame.extend_from_slice(address.as_bytes());
        frame.extend_from_slice(&ascii::byte_to_ascii_hex(size));
        frame.extend_from_slice(payload_hex);
        seal(frame)
    }

    fn make_wss(station: &str, address: &str, value: &[u8]) -> Vec<u8> {
        let mut frame = vec![ENQ];
        frame.extend_from_slice(station.as_bytes());
        frame.extend_from_slice(b"WSS");
        frame.extend_from_slice(b"01"); // one block
        frame.extend_from_slice(format!("{:02}", address.len()).as_bytes());
        frame.extend_from_slice(address.as_bytes());
        frame.extend_from_slice(value);
        seal(frame)
    }

    #[test]
    fn test_byte_read_response() {
        let device = XgbDevice::new();
        device
            .store()
            .write_bytes(MemoryArea::D, 0, &[0x12, 0x34])
            .unwrap();

        let frame = make_read("01", "%DB0", 2);
        let response = process_frame(&device, &frame).unwrap();

        // ENQ '0' '1' 'r' 'S' 'B' '0' '1' then "02" then "1234" hex.
        assert_eq!(response[0], ENQ);
        assert_eq!(&response[1..3], b"01");
        assert_eq!(&response[3..8], b"rSB01");
        assert_eq!(&response[8..10], b"02");
        assert_eq!(&response[10..14], b"1234");
        assert_eq!(response[14], ETX);
    }

    #[test]
    fn test_read_response_checksum() {
        let device = XgbDevice::new();
        device
            .store()
            .write_bytes(MemoryArea::M, 1, &[0xAB, 0xCD, 0xEF, 0x01])
            .unwrap();

        let frame = make_read("01", "%MB010", 4);
        let response = process_frame(&device, &frame).unwrap();

        let body = &response[..response.len() - 2];
        let expected = ascii::byte_to_ascii_hex(checksum(body));
        assert_eq!(&response[response.len() - 2..], expected);

        // Corrupting any byte before the checksum must break an
        // independent recomputation.
        for i in 0..body.len() {
            let mut corrupted = response.clone();
            corrupted[i] ^= 0x01;
            let recomputed =
                ascii::byte_to_ascii_hex(checksum(&corrupted[..corrupted.len() - 2]));
            assert_ne!(
                &corrupted[corrupted.len() - 2..],
                recomputed,
                "corruption at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn test_bit_read_starts_at_letter_index() {
        let device = XgbDevice::new();
        // Bits 10.. of area M live in bytes 1-2: set bit 10 and bit 12.
        device.store().write_bit(MemoryArea::M, 10, true).unwrap();
        device.store().write_bit(MemoryArea::M, 12, true).unwrap();

        // "A" start token means bit index 10.
        let frame = make_read("01", "%MBA", 1);
        let response = process_frame(&device, &frame).unwrap();

        // One byte of packed bits: bit 0 ← bit 10, bit 2 ← bit 12.
        assert_eq!(&response[8..10], b"01");
        assert_eq!(&response[10..12], b"05");
    }

    #[test]
    fn test_bit_read_size_counts_bytes_of_bits() {
        let device = XgbDevice::new();
        let frame = make_read("01", "%MB0", 2);
        let response = process_frame(&device, &frame).unwrap();

        // size 2 → 16 bits → 2 packed bytes → 4 hex characters.
        assert_eq!(&response[8..10], b"02");
        assert_eq!(&response[10..14], b"0000");
    }

    #[test]
    fn test_tb_class_is_never_served() {
        let device = XgbDevice::new();
        let frame = make_read("01", "%TB0", 1);
        assert!(matches!(
            process_frame(&device, &frame),
            Err(XgbError::UnsupportedArea('T'))
        ));
    }

    #[test]
    fn test_word_write() {
        let device = XgbDevice::new();
        let frame = make_write("05", "%DW100", 2, b"BEEF");
        let response = process_frame(&device, &frame).unwrap();

        assert_eq!(response, vec![ENQ, b'0', b'5', b'w', b'S', b'B', ETX]);
        assert_eq!(
            device.store().read_bytes(MemoryArea::D, 100, 2).unwrap(),
            vec![0xBE, 0xEF]
        );
    }

    #[test]
    fn test_bit_write_value_text() {
        let device = XgbDevice::new();

        let frame = make_write("01", "%MX005", 1, b"01");
        process_frame(&device, &frame).unwrap();
        assert!(device.store().read_bit(MemoryArea::M, 5).unwrap());

        // Any value other than "01" writes false.
        let frame = make_write("01", "%MX005", 1, b"00");
        process_frame(&device, &frame).unwrap();
        assert!(!device.store().read_bit(MemoryArea::M, 5).unwrap());

        let frame = make_write("01", "%MX006", 1, b"XY");
        process_frame(&device, &frame).unwrap();
        assert!(!device.store().read_bit(MemoryArea::M, 6).unwrap());
    }

    #[test]
    fn test_wss_bit_write_with_letter_start() {
        let device = XgbDevice::new();

        // "A" resolves to bit index 10.
        let frame = make_wss("01", "%MXA", b"01");
        let response = process_frame(&device, &frame).unwrap();

        assert_eq!(response[3], b'w');
        assert!(device.store().read_bit(MemoryArea::M, 10).unwrap());
    }

    #[test]
    fn test_wss_word_write_single_byte() {
        let device = XgbDevice::new();
        let frame = make_wss("01", "%DW200", b"7F");
        process_frame(&device, &frame).unwrap();
        assert_eq!(
            device.store().read_bytes(MemoryArea::D, 200, 1).unwrap(),
            vec![0x7F]
        );
    }

    #[test]
    fn test_double_and_long_word_classes_are_unimplemented() {
        let device = XgbDevice::new();
        let before = device.save_to_bytes();

        for address in ["%DD100", "%DL100"] {
            let frame = make_write("01", address, 4, b"0011223344556677");
            assert!(matches!(
                process_frame(&device, &frame),
                Err(XgbError::Unimplemented(_))
            ));
        }
        assert_eq!(device.save_to_bytes(), before);
    }

    #[test]
    fn test_unknown_write_class_is_typed_error() {
        let device = XgbDevice::new();
        let frame = make_write("01", "%QZ10", 1, b"00");
        assert!(matches!(
            process_frame(&device, &frame),
            Err(XgbError::Unimplemented(_))
        ));
    }

    #[test]
    fn test_rejects_short_frame() {
        let device = XgbDevice::new();
        assert!(matches!(
            process_frame(&device, &[ENQ, b'0', b'1', ETX]),
            Err(XgbError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_rejects_missing_enq() {
        let device = XgbDevice::new();
        let mut frame = make_read("01", "%DB0", 1);
        frame[0] = 0x00;
        assert!(matches!(
            process_frame(&device, &frame),
            Err(XgbError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_command_token() {
        let device = XgbDevice::new();
        let mut frame = make_read("01", "%DB0", 1);
        frame[3] = b'x';
        assert!(matches!(
            process_frame(&device, &frame),
            Err(XgbError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_out_of_range_read_is_typed_error() {
        let device = XgbDevice::new();
        // Capacity is 65536; asking for 255 bytes at 65535 crosses the end.
        let frame = make_read("01", "%DB65535", 0xFF);
        assert!(matches!(
            process_frame(&device, &frame),
            Err(XgbError::OutOfRange { .. })
        ));
    }
}
