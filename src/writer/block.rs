//! Block contract, registry and iterator.
//!
//! A Cask body is a flat sequence of self-describing blocks. Each block
//! gets its address from the order it entered the registry, and
//! cross-block references carry those addresses.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::format::{BlockType, BLOCK_FLAG_WIDE, BLOCK_HEADER_SIZE};
use crate::util::Result;

/// Block address, assigned at registry append. 1-based.
pub type Addr = u32;

/// The "no reference" sentinel address.
pub const NULL_ADDR: Addr = 0;

/// One serializable unit of the file body.
///
/// The two-phase contract is the framework's central invariant:
/// [`calc_body_length`](Self::calc_body_length) must equal the number of
/// bytes [`write_body`](Self::write_body) emits for the same width.
/// Readers use the declared length to skip blocks they do not
/// understand, so a divergence corrupts every block that follows.
pub trait Block {
    /// Type tag written into the block header.
    fn block_type(&self) -> BlockType;

    /// Pre-pass run once per write session, before any length
    /// calculation, to materialize derived fields.
    fn prepare_write(&mut self) -> Result<()> {
        Ok(())
    }

    /// Exact body size in bytes for the given width.
    fn calc_body_length(&self, wide: bool) -> u32;

    /// Emit the body. Must write exactly `calc_body_length(wide)` bytes,
    /// in the field order defined by the concrete block kind.
    fn write_body(&self, out: &mut dyn Write, wide: bool) -> Result<()>;

    /// Emit one full block: the 10-byte header (address, flags, type
    /// tag, body length), then the body. Returns the total bytes
    /// written.
    fn write_block(&self, out: &mut dyn Write, wide: bool, addr: Addr) -> Result<u64> {
        let body_len = self.calc_body_length(wide);
        out.write_u32::<BigEndian>(addr)?;
        out.write_u8(if wide { BLOCK_FLAG_WIDE } else { 0 })?;
        out.write_u8(self.block_type() as u8)?;
        out.write_u32::<BigEndian>(body_len)?;
        self.write_body(out, wide)?;
        Ok(u64::from(BLOCK_HEADER_SIZE) + u64::from(body_len))
    }
}

/// Ordered, owning collection of all blocks bound for one file.
///
/// Addresses are assigned at append time as `index + 1`, so iteration
/// order and address order always coincide and [`NULL_ADDR`] never
/// aliases a real block.
#[derive(Default)]
pub struct BlockRegistry {
    blocks: Vec<Box<dyn Block>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Append a block and return its assigned address.
    pub fn append(&mut self, block: Box<dyn Block>) -> Addr {
        self.blocks.push(block);
        self.blocks.len() as Addr
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First registered block, if any.
    pub fn first(&self) -> Option<&dyn Block> {
        self.blocks.first().map(|b| b.as_ref())
    }

    /// Most recently registered block, if any.
    pub fn last(&self) -> Option<&dyn Block> {
        self.blocks.last().map(|b| b.as_ref())
    }

    /// Look up a block by address. [`NULL_ADDR`] resolves to nothing.
    pub fn get(&self, addr: Addr) -> Option<&dyn Block> {
        if addr == NULL_ADDR {
            return None;
        }
        self.blocks.get(addr as usize - 1).map(|b| b.as_ref())
    }

    /// Look up a block by address for mutation.
    pub fn get_mut(&mut self, addr: Addr) -> Option<&mut (dyn Block + '_)> {
        if addr == NULL_ADDR {
            return None;
        }
        self.blocks.get_mut(addr as usize - 1).map(|b| b.as_mut() as &mut dyn Block)
    }

    /// Forward-only cursor over the registry. Holding it borrows the
    /// registry, so appends during traversal do not compile.
    pub fn iter(&self) -> BlockIter<'_> {
        BlockIter {
            blocks: &self.blocks,
            cur: 0,
        }
    }

    /// Mutable traversal in registry order, used by the prepare pass.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Block + '_)> + '_ {
        self.blocks.iter_mut().map(|b| b.as_mut() as &mut dyn Block)
    }
}

/// Restartable forward cursor over a [`BlockRegistry`], yielding each
/// block with its address.
pub struct BlockIter<'a> {
    blocks: &'a [Box<dyn Block>],
    cur: usize,
}

impl BlockIter<'_> {
    /// Return the cursor to the first block.
    pub fn reset(&mut self) {
        self.cur = 0;
    }
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = (Addr, &'a dyn Block);

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.blocks.get(self.cur)?;
        self.cur += 1;
        Some((self.cur as Addr, block.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RawBlock(Vec<u8>);

    impl Block for RawBlock {
        fn block_type(&self) -> BlockType {
            BlockType::MeshData
        }

        fn calc_body_length(&self, _wide: bool) -> u32 {
            self.0.len() as u32
        }

        fn write_body(&self, out: &mut dyn Write, _wide: bool) -> Result<()> {
            out.write_all(&self.0)?;
            Ok(())
        }
    }

    #[test]
    fn test_write_block_header() {
        let block = RawBlock(vec![0xAA; 6]);
        let mut buf = Vec::new();
        let total = block.write_block(&mut buf, true, 9).unwrap();

        assert_eq!(total, buf.len() as u64);
        assert_eq!(&buf[0..4], &[0, 0, 0, 9]);
        assert_eq!(buf[4], BLOCK_FLAG_WIDE);
        assert_eq!(buf[5], BlockType::MeshData as u8);
        assert_eq!(&buf[6..10], &[0, 0, 0, 6]);
        assert_eq!(&buf[10..], &[0xAA; 6]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = BlockRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.first().is_none());
        assert!(registry.last().is_none());
        assert!(registry.iter().next().is_none());
    }

    #[test]
    fn test_append_assigns_sequential_addresses() {
        let mut registry = BlockRegistry::new();
        for i in 1..=4u32 {
            let addr = registry.append(Box::new(RawBlock(vec![i as u8])));
            assert_eq!(addr, i);
        }
        assert_eq!(registry.len(), 4);
        assert!(registry.get(NULL_ADDR).is_none());
        assert!(registry.get(4).is_some());
        assert!(registry.get(5).is_none());
    }

    #[test]
    fn test_iterator_yields_all_then_none() {
        let mut registry = BlockRegistry::new();
        for _ in 0..3 {
            registry.append(Box::new(RawBlock(Vec::new())));
        }

        let mut iter = registry.iter();
        let addrs: Vec<Addr> = iter.by_ref().map(|(addr, _)| addr).collect();
        assert_eq!(addrs, [1, 2, 3]);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_iterator_reset_mid_traversal() {
        let mut registry = BlockRegistry::new();
        for _ in 0..3 {
            registry.append(Box::new(RawBlock(Vec::new())));
        }

        let mut iter = registry.iter();
        assert_eq!(iter.next().map(|(addr, _)| addr), Some(1));
        assert_eq!(iter.next().map(|(addr, _)| addr), Some(2));

        iter.reset();
        assert_eq!(iter.next().map(|(addr, _)| addr), Some(1));
    }
}
