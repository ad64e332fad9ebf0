//! Textual device address resolution.
//!
//! Both protocols carry device addresses as short ASCII strings. Two
//! grammars exist:
//!
//! - The generic form `<prefix><area>[<type-letter>]<digits>` used by the
//!   byte-oriented read/write entry points, e.g. `%MW100` or `%DB2000`.
//!   The prefix character is ignored, the second character selects the
//!   area, an optional data-type letter is skipped, and the trailing
//!   digits are the zero-based start index.
//! - A single-token form used by the serial protocol for bit start
//!   addresses, where the letters `A`..`F` stand for the fixed indices
//!   10..15 (a station-firmware convention, not hexadecimal) and anything
//!   else is a decimal integer.
//!
//! # Example
//!
//! ```
//! use xgb_sim::address::{resolve_generic, resolve_letter_or_digit};
//! use xgb_sim::store::MemoryArea;
//!
//! let addr = resolve_generic("%MW100").unwrap();
//! assert_eq!((addr.area, addr.index), (MemoryArea::M, 100));
//!
//! assert_eq!(resolve_letter_or_digit("A").unwrap(), 10);
//! assert_eq!(resolve_letter_or_digit("7").unwrap(), 7);
//! ```

use crate::error::{Result, XgbError};
use crate::store::MemoryArea;

/// Minimum length of a generic address: prefix, area letter, index.
pub const MIN_GENERIC_LEN: usize = 3;

/// A resolved device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAddress {
    /// Target memory area.
    pub area: MemoryArea,
    /// Zero-based start index. Byte offset for byte access, bit offset for
    /// bit access; the access kind is the caller's.
    pub index: usize,
}

/// Resolve a generic-form address into `(area, index)`.
///
/// Fails with [`XgbError::UnsupportedArea`] when the area letter is not one
/// of `P`/`Q`/`M`/`D` and with [`XgbError::InvalidAddress`] for any other
/// parse failure. No word-size scaling is applied; the digits are taken
/// verbatim as the start index.
pub fn resolve_generic(address: &str) -> Result<DeviceAddress> {
    let bytes = address.as_bytes();
    if !address.is_ascii() || bytes.len() < MIN_GENERIC_LEN {
        return Err(XgbError::InvalidAddress(address.to_string()));
    }

    let area = MemoryArea::from_letter(bytes[1] as char)?;

    // An optional data-type letter sits between the area and the index
    // ("%MW100", "%MB200"); bare forms like "xM100" have none.
    let digits = if bytes[2].is_ascii_digit() {
        &address[2..]
    } else {
        &address[3..]
    };
    let index = parse_index(digits, address)?;

    Ok(DeviceAddress { area, index })
}

/// Resolve a serial-protocol start token: `A`..`F` map to the fixed indices
/// 10..15, anything else is parsed as a decimal integer.
pub fn resolve_letter_or_digit(token: &str) -> Result<usize> {
    match token {
        "A" => Ok(10),
        "B" => Ok(11),
        "C" => Ok(12),
        "D" => Ok(13),
        "E" => Ok(14),
        "F" => Ok(15),
        _ => parse_index(token, token),
    }
}

fn parse_index(digits: &str, address: &str) -> Result<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(XgbError::InvalidAddress(address.to_string()));
    }
    digits
        .parse::<usize>()
        .map_err(|_| XgbError::InvalidAddress(address.to_string()))
}
