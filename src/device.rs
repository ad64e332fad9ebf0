//! The emulated unit's logical entry points.
//!
//! [`XgbDevice`] wraps the [`RegisterStore`] behind the text-addressed
//! read/write operations that both protocol codecs (and embedding
//! applications) consume, plus data-pool persistence. One device instance
//! is created at startup and shared via `Arc` by every session.

use std::path::Path;

use crate::address::resolve_generic;
use crate::error::Result;
use crate::store::RegisterStore;

/// One emulated XGB unit: register memory plus its addressed operations.
pub struct XgbDevice {
    store: RegisterStore,
}

impl XgbDevice {
    /// Create a device with the default per-area capacity, all areas
    /// zero-filled.
    pub fn new() -> Self {
        Self {
            store: RegisterStore::new(),
        }
    }

    /// Create a device with a custom per-area capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: RegisterStore::with_capacity(capacity),
        }
    }

    /// Direct access to the underlying register store.
    pub fn store(&self) -> &RegisterStore {
        &self.store
    }

    /// Read `count` bytes at a generic-form address like `"%MW100"`.
    pub fn read(&self, address: &str, count: u16) -> Result<Vec<u8>> {
        let addr = resolve_generic(address)?;
        self.store.read_bytes(addr.area, addr.index, count as usize)
    }

    /// Write raw bytes at a generic-form address.
    pub fn write(&self, address: &str, data: &[u8]) -> Result<()> {
        let addr = resolve_generic(address)?;
        self.store.write_bytes(addr.area, addr.index, data)
    }

    /// Read a single byte.
    pub fn read_byte(&self, address: &str) -> Result<u8> {
        Ok(self.read(address, 1)?[0])
    }

    /// Write a single byte.
    pub fn write_byte(&self, address: &str, value: u8) -> Result<()> {
        self.write(address, &[value])
    }

    /// Read a single bit; the address index is taken as a bit offset.
    pub fn read_bool(&self, address: &str) -> Result<bool> {
        let addr = resolve_generic(address)?;
        self.store.read_bit(addr.area, addr.index)
    }

    /// Write a single bit; the address index is taken as a bit offset.
    pub fn write_bool(&self, address: &str, value: bool) -> Result<()> {
        let addr = resolve_generic(address)?;
        self.store.write_bit(addr.area, addr.index, value)
    }

    /// Serialize the whole data pool (areas concatenated P, Q, M, D).
    pub fn save_to_bytes(&self) -> Vec<u8> {
        self.store.export_snapshot()
    }

    /// Restore the whole data pool from [`save_to_bytes`](Self::save_to_bytes)
    /// output. All-or-nothing: a wrong-sized blob changes nothing.
    pub fn load_from_bytes(&self, blob: &[u8]) -> Result<()> {
        self.store.import_snapshot(blob)
    }

    /// Persist the data pool to a file.
    pub fn save_data_pool<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.save_to_bytes())?;
        Ok(())
    }

    /// Load the data pool from a file written by
    /// [`save_data_pool`](Self::save_data_pool).
    pub fn load_data_pool<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let blob = std::fs::read(path)?;
        self.load_from_bytes(&blob)
    }
}

impl Default for XgbDevice {
    fn default() -> Self {
        Self::new()
    }
}
