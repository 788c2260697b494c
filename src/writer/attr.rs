//! Block attribute stores.
//!
//! Blocks that carry metadata hold two independent stores: the
//! framework-reserved properties and the caller-defined user attributes.
//! Both share one wire form: a u32 section length followed by
//! `key u16, value length u16, value bytes` entries. An empty store still
//! costs its 4-byte zero length prefix.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use glam::DMat4;

use crate::format::AttrType;
use crate::util::{Error, Result};
use crate::writer::block::Addr;
use crate::writer::write_util::mtx4_bytes;

#[derive(Debug, Clone)]
struct AttrEntry {
    key: u16,
    attr_type: AttrType,
    value: Vec<u8>,
}

/// Ordered typed key/value store serialized as a self-contained section.
#[derive(Debug, Clone, Default)]
pub struct AttrStore {
    entries: Vec<AttrEntry>,
}

impl AttrStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of staged entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage a value under the given key, replacing any previous value
    /// while keeping the key's original position.
    ///
    /// Oversized values are rejected here so the length calculation and
    /// the write phase can never disagree about this section.
    pub fn set(&mut self, key: u16, attr_type: AttrType, value: Vec<u8>) -> Result<()> {
        if value.len() > u16::MAX as usize {
            return Err(Error::AttrTooLarge {
                key,
                len: value.len(),
            });
        }
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.attr_type = attr_type;
                entry.value = value;
            }
            None => self.entries.push(AttrEntry {
                key,
                attr_type,
                value,
            }),
        }
        Ok(())
    }

    /// Stage a block address value.
    pub fn set_addr(&mut self, key: u16, addr: Addr) -> Result<()> {
        self.set(key, AttrType::Baddr, addr.to_be_bytes().to_vec())
    }

    /// Stage a 4x4 matrix value.
    pub fn set_mtx4(&mut self, key: u16, mtx: &DMat4) -> Result<()> {
        self.set(key, AttrType::Mtx4, mtx4_bytes(mtx))
    }

    /// Look up a staged value by key.
    pub fn get(&self, key: u16) -> Option<(AttrType, &[u8])> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| (e.attr_type, e.value.as_slice()))
    }

    /// Serialized size of the section, including its own length prefix.
    pub fn calc_length(&self) -> u32 {
        4 + self
            .entries
            .iter()
            .map(|e| 4 + e.value.len() as u32)
            .sum::<u32>()
    }

    /// Emit the section. Writes exactly [`calc_length`](Self::calc_length)
    /// bytes.
    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        let total: u32 = self
            .entries
            .iter()
            .map(|e| 4 + e.value.len() as u32)
            .sum();
        out.write_u32::<BigEndian>(total)?;
        for e in &self.entries {
            out.write_u16::<BigEndian>(e.key)?;
            out.write_u16::<BigEndian>(e.value.len() as u16)?;
            out.write_all(&e.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_costs_length_prefix() {
        let store = AttrStore::new();
        assert!(store.is_empty());
        assert_eq!(store.calc_length(), 4);

        let mut buf = Vec::new();
        store.write(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut store = AttrStore::new();
        store.set(1, AttrType::Uint16, vec![0, 7]).unwrap();
        store.set(2, AttrType::String, b"abc".to_vec()).unwrap();
        store.set(1, AttrType::Uint16, vec![0, 9]).unwrap();

        assert_eq!(store.len(), 2);
        let (ty, value) = store.get(1).unwrap();
        assert_eq!(ty, AttrType::Uint16);
        assert_eq!(value, [0, 9]);

        // Replacement keeps key 1 ahead of key 2.
        let mut buf = Vec::new();
        store.write(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[4], buf[5]]), 1);
    }

    #[test]
    fn test_calc_length_matches_written_bytes() {
        let mut store = AttrStore::new();
        store.set_addr(1, 42).unwrap();
        store.set_mtx4(2, &DMat4::IDENTITY).unwrap();
        store.set(9, AttrType::String, b"export".to_vec()).unwrap();

        let mut buf = Vec::new();
        store.write(&mut buf).unwrap();
        assert_eq!(buf.len() as u32, store.calc_length());
        // Section length prefix excludes itself.
        assert_eq!(
            u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            store.calc_length() - 4
        );
    }

    #[test]
    fn test_oversized_value_rejected() {
        let mut store = AttrStore::new();
        let err = store.set(1, AttrType::String, vec![0; 70_000]);
        assert!(matches!(err, Err(Error::AttrTooLarge { key: 1, .. })));
        assert!(store.is_empty());
    }
}
