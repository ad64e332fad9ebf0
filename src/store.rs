//! Register memory model.
//!
//! An XGB unit exposes four independent memory areas (`P`, `Q`, `M`, `D`),
//! each a flat byte buffer of identical capacity. Both wire protocols
//! ultimately resolve to byte-range or single-bit access on these buffers,
//! so every operation here is bounds-checked and returns a typed error
//! instead of touching memory past the area's end.
//!
//! Bit addressing and byte addressing share the same storage: bit `i` of an
//! area is bit `i % 8` of byte `i / 8`.
//!
//! # Concurrency
//!
//! Each area sits behind its own `RwLock`, so sessions on different areas
//! never contend and concurrent readers of one area proceed in parallel.
//! A read that overlaps an in-flight write observes either the fully-old or
//! fully-new bytes of that write, never a torn value.
//!
//! # Example
//!
//! ```
//! use xgb_sim::store::{MemoryArea, RegisterStore};
//!
//! let store = RegisterStore::new();
//! store.write_bytes(MemoryArea::M, 100, &[0xAB, 0xCD]).unwrap();
//! assert_eq!(store.read_bytes(MemoryArea::M, 100, 2).unwrap(), vec![0xAB, 0xCD]);
//! ```

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, XgbError};

/// Default capacity of each area in bytes.
pub const DEFAULT_CAPACITY: usize = 65536;

/// Number of memory areas.
pub const AREA_COUNT: usize = 4;

/// One of the four addressable memory areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryArea {
    P,
    Q,
    M,
    D,
}

impl MemoryArea {
    /// All areas in snapshot order.
    pub const ALL: [MemoryArea; AREA_COUNT] =
        [MemoryArea::P, MemoryArea::Q, MemoryArea::M, MemoryArea::D];

    /// Map an area selector letter to its area.
    pub fn from_letter(letter: char) -> Result<Self> {
        match letter {
            'P' => Ok(MemoryArea::P),
            'Q' => Ok(MemoryArea::Q),
            'M' => Ok(MemoryArea::M),
            'D' => Ok(MemoryArea::D),
            other => Err(XgbError::UnsupportedArea(other)),
        }
    }

    /// The area's selector letter.
    pub fn letter(&self) -> char {
        match self {
            MemoryArea::P => 'P',
            MemoryArea::Q => 'Q',
            MemoryArea::M => 'M',
            MemoryArea::D => 'D',
        }
    }
}

impl fmt::Display for MemoryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The shared register memory of one emulated unit.
///
/// Created once at server start and shared (via `Arc`) by every session.
/// Areas are never resized after construction.
pub struct RegisterStore {
    areas: [RwLock<Vec<u8>>; AREA_COUNT],
    capacity: usize,
}

impl RegisterStore {
    /// Create a store with the default per-area capacity (65536 bytes),
    /// all areas zero-filled.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store with a custom per-area capacity, all areas zero-filled.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            areas: [
                RwLock::new(vec![0; capacity]),
                RwLock::new(vec![0; capacity]),
                RwLock::new(vec![0; capacity]),
                RwLock::new(vec![0; capacity]),
            ],
            capacity,
        }
    }

    /// Per-area capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total size of a persistence snapshot (all four areas).
    pub fn snapshot_len(&self) -> usize {
        self.capacity * AREA_COUNT
    }

    fn cell(&self, area: MemoryArea) -> &RwLock<Vec<u8>> {
        match area {
            MemoryArea::P => &self.areas[0],
            MemoryArea::Q => &self.areas[1],
            MemoryArea::M => &self.areas[2],
            MemoryArea::D => &self.areas[3],
        }
    }

    // A poisoned lock still holds valid register bytes; a panicked session
    // must not take the whole data pool down with it.
    fn read_guard(&self, area: MemoryArea) -> RwLockReadGuard<'_, Vec<u8>> {
        match self.cell(area).read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_guard(&self, area: MemoryArea) -> RwLockWriteGuard<'_, Vec<u8>> {
        match self.cell(area).write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_byte_range(&self, area: MemoryArea, start: usize, len: usize) -> Result<()> {
        let end = start.checked_add(len).ok_or(XgbError::OutOfRange {
            area,
            start,
            end: usize::MAX,
            capacity: self.capacity,
        })?;
        if end > self.capacity {
            return Err(XgbError::OutOfRange {
                area,
                start,
                end,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn check_bit_index(&self, area: MemoryArea, bit: usize) -> Result<()> {
        if bit / 8 >= self.capacity {
            return Err(XgbError::OutOfRange {
                area,
                start: bit / 8,
                end: bit / 8 + 1,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Read `len` bytes starting at byte offset `start`.
    pub fn read_bytes(&self, area: MemoryArea, start: usize, len: usize) -> Result<Vec<u8>> {
        self.check_byte_range(area, start, len)?;
        let buffer = self.read_guard(area);
        Ok(buffer[start..start + len].to_vec())
    }

    /// Write `data` starting at byte offset `start`.
    pub fn write_bytes(&self, area: MemoryArea, start: usize, data: &[u8]) -> Result<()> {
        self.check_byte_range(area, start, data.len())?;
        let mut buffer = self.write_guard(area);
        buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Read the bit at bit offset `bit`.
    pub fn read_bit(&self, area: MemoryArea, bit: usize) -> Result<bool> {
        self.check_bit_index(area, bit)?;
        let buffer = self.read_guard(area);
        Ok(buffer[bit / 8] & (1 << (bit % 8)) != 0)
    }

    /// Set or clear the bit at bit offset `bit`, leaving every other bit of
    /// the containing byte untouched.
    pub fn write_bit(&self, area: MemoryArea, bit: usize, value: bool) -> Result<()> {
        self.check_bit_index(area, bit)?;
        let mut buffer = self.write_guard(area);
        let mask = 1u8 << (bit % 8);
        if value {
            buffer[bit / 8] |= mask;
        } else {
            buffer[bit / 8] &= !mask;
        }
        Ok(())
    }

    /// Read `count` consecutive bits starting at bit offset `start_bit`.
    pub fn read_bits(&self, area: MemoryArea, start_bit: usize, count: usize) -> Result<Vec<bool>> {
        if count == 0 {
            self.check_bit_index(area, start_bit)?;
            return Ok(Vec::new());
        }
        let last = start_bit.checked_add(count - 1).ok_or(XgbError::OutOfRange {
            area,
            start: start_bit / 8,
            end: usize::MAX,
            capacity: self.capacity,
        })?;
        self.check_bit_index(area, start_bit)?;
        self.check_bit_index(area, last)?;
        let buffer = self.read_guard(area);
        Ok((start_bit..=last)
            .map(|bit| buffer[bit / 8] & (1 << (bit % 8)) != 0)
            .collect())
    }

    /// Export all four areas as one flat blob, concatenated in P, Q, M, D
    /// order.
    pub fn export_snapshot(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.snapshot_len());
        for area in MemoryArea::ALL {
            blob.extend_from_slice(&self.read_guard(area));
        }
        blob
    }

    /// Replace all four areas from a flat blob produced by
    /// [`export_snapshot`](Self::export_snapshot).
    ///
    /// The blob must be exactly `4 * capacity` bytes; anything else fails
    /// with [`XgbError::MalformedSnapshot`] and leaves every area untouched.
    pub fn import_snapshot(&self, blob: &[u8]) -> Result<()> {
        let expected = self.snapshot_len();
        if blob.len() != expected {
            return Err(XgbError::MalformedSnapshot {
                expected,
                actual: blob.len(),
            });
        }
        // Hold all four write guards so no reader sees a half-imported pool.
        // Acquisition order matches MemoryArea::ALL everywhere.
        let mut guards: Vec<RwLockWriteGuard<'_, Vec<u8>>> = MemoryArea::ALL
            .iter()
            .map(|&area| self.write_guard(area))
            .collect();
        for (i, guard) in guards.iter_mut().enumerate() {
            let chunk = &blob[i * self.capacity..(i + 1) * self.capacity];
            guard.copy_from_slice(chunk);
        }
        Ok(())
    }
}

impl Default for RegisterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_round_trip() {
        let store = RegisterStore::new();
        let data = [1u8, 2, 3, 4, 5];

        for area in MemoryArea::ALL {
            store.write_bytes(area, 1000, &data).unwrap();
            assert_eq!(store.read_bytes(area, 1000, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_areas_are_independent() {
        let store = RegisterStore::new();
        store.write_bytes(MemoryArea::M, 0, &[0xFF]).unwrap();

        assert_eq!(store.read_bytes(MemoryArea::P, 0, 1).unwrap(), vec![0]);
        assert_eq!(store.read_bytes(MemoryArea::Q, 0, 1).unwrap(), vec![0]);
        assert_eq!(store.read_bytes(MemoryArea::D, 0, 1).unwrap(), vec![0]);
    }

    #[test]
    fn test_read_past_capacity_rejected() {
        let store = RegisterStore::with_capacity(64);

        assert!(store.read_bytes(MemoryArea::P, 0, 64).is_ok());
        let err = store.read_bytes(MemoryArea::P, 60, 5).unwrap_err();
        assert!(matches!(err, XgbError::OutOfRange { .. }));
    }

    #[test]
    fn test_write_past_capacity_leaves_store_unmodified() {
        let store = RegisterStore::with_capacity(64);
        let err = store.write_bytes(MemoryArea::D, 63, &[1, 2]).unwrap_err();
        assert!(matches!(err, XgbError::OutOfRange { .. }));
        assert_eq!(store.read_bytes(MemoryArea::D, 63, 1).unwrap(), vec![0]);
    }

    #[test]
    fn test_bit_round_trip() {
        let store = RegisterStore::new();

        store.write_bit(MemoryArea::M, 19, true).unwrap();
        assert!(store.read_bit(MemoryArea::M, 19).unwrap());

        store.write_bit(MemoryArea::M, 19, false).unwrap();
        assert!(!store.read_bit(MemoryArea::M, 19).unwrap());
    }

    #[test]
    fn test_bit_write_does_not_disturb_neighbors() {
        let store = RegisterStore::new();
        store.write_bytes(MemoryArea::Q, 2, &[0b1010_1010]).unwrap();

        // Bit 16 is bit 0 of byte 2.
        store.write_bit(MemoryArea::Q, 16, true).unwrap();
        assert_eq!(store.read_bytes(MemoryArea::Q, 2, 1).unwrap(), vec![0b1010_1011]);

        store.write_bit(MemoryArea::Q, 17, false).unwrap();
        assert_eq!(store.read_bytes(MemoryArea::Q, 2, 1).unwrap(), vec![0b1010_1001]);
    }

    #[test]
    fn test_bit_and_byte_views_agree() {
        let store = RegisterStore::new();
        store.write_bytes(MemoryArea::M, 1, &[0x81]).unwrap();

        // 0x81 = bits 0 and 7 of byte 1, i.e. bit offsets 8 and 15.
        assert!(store.read_bit(MemoryArea::M, 8).unwrap());
        assert!(!store.read_bit(MemoryArea::M, 9).unwrap());
        assert!(store.read_bit(MemoryArea::M, 15).unwrap());
    }

    #[test]
    fn test_bit_index_bounds() {
        let store = RegisterStore::with_capacity(2);

        assert!(store.read_bit(MemoryArea::P, 15).is_ok());
        assert!(matches!(
            store.read_bit(MemoryArea::P, 16),
            Err(XgbError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.write_bit(MemoryArea::P, 16, true),
            Err(XgbError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_read_bits_bulk() {
        let store = RegisterStore::new();
        store.write_bytes(MemoryArea::M, 0, &[0b0000_0101]).unwrap();

        let bits = store.read_bits(MemoryArea::M, 0, 4).unwrap();
        assert_eq!(bits, vec![true, false, true, false]);

        // Spanning a byte boundary.
        store.write_bytes(MemoryArea::M, 1, &[0b0000_0001]).unwrap();
        let bits = store.read_bits(MemoryArea::M, 6, 4).unwrap();
        assert_eq!(bits, vec![false, false, true, false]);
    }

    #[test]
    fn test_read_bits_bounds() {
        let store = RegisterStore::with_capacity(1);
        assert!(store.read_bits(MemoryArea::M, 0, 8).is_ok());
        assert!(matches!(
            store.read_bits(MemoryArea::M, 0, 9),
            Err(XgbError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = RegisterStore::with_capacity(16);
        store.write_bytes(MemoryArea::P, 0, &[1]).unwrap();
        store.write_bytes(MemoryArea::Q, 1, &[2]).unwrap();
        store.write_bytes(MemoryArea::M, 2, &[3]).unwrap();
        store.write_bytes(MemoryArea::D, 3, &[4]).unwrap();

        let blob = store.export_snapshot();
        assert_eq!(blob.len(), 64);

        let restored = RegisterStore::with_capacity(16);
        restored.import_snapshot(&blob).unwrap();
        assert_eq!(restored.export_snapshot(), blob);
        assert_eq!(restored.read_bytes(MemoryArea::M, 2, 1).unwrap(), vec![3]);
    }

    #[test]
    fn test_snapshot_layout_order() {
        let store = RegisterStore::with_capacity(4);
        store.write_bytes(MemoryArea::P, 0, &[0x10]).unwrap();
        store.write_bytes(MemoryArea::Q, 0, &[0x20]).unwrap();
        store.write_bytes(MemoryArea::M, 0, &[0x30]).unwrap();
        store.write_bytes(MemoryArea::D, 0, &[0x40]).unwrap();

        let blob = store.export_snapshot();
        assert_eq!(blob[0], 0x10);
        assert_eq!(blob[4], 0x20);
        assert_eq!(blob[8], 0x30);
        assert_eq!(blob[12], 0x40);
    }

    #[test]
    fn test_import_wrong_size_is_rejected() {
        let store = RegisterStore::with_capacity(16);
        store.write_bytes(MemoryArea::M, 0, &[7]).unwrap();

        let err = store.import_snapshot(&[0u8; 63]).unwrap_err();
        assert!(matches!(
            err,
            XgbError::MalformedSnapshot {
                expected: 64,
                actual: 63
            }
        ));
        // Store untouched by the failed import.
        assert_eq!(store.read_bytes(MemoryArea::M, 0, 1).unwrap(), vec![7]);
    }
}
