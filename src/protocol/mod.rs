//! Protocol module - the two wire codecs and their shared helpers.
//!
//! - [`fast_enet`]: the binary framed protocol spoken over TCP
//! - [`cnet`]: the ASCII/checksum framed protocol spoken over serial
//! - [`ascii`]: hex-ASCII encode/decode shared by the Cnet path
//!
//! Both codecs are pure: they take a complete frame plus the device and
//! return response bytes (or a typed error) without performing any I/O.

pub mod ascii;
pub mod cnet;
pub mod fast_enet;
