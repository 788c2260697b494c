//! Cask archive writer: container header and the block write session.

use std::path::Path;

use tracing::{debug, trace};

use crate::format::{
    BODY_SIZE_OFFSET, CASK_MAGIC, COMPRESSION_NONE, FLAGS_OFFSET, HEADER_FLAG_WIDE, VERSION_MAJOR,
    VERSION_MINOR,
};
use crate::util::{Error, Result};
use crate::writer::block::BlockRegistry;
use crate::writer::stream::OStream;

/// Cask file writer.
///
/// One archive is one write session: create it, stage blocks in a
/// [`BlockRegistry`], then call [`write_blocks`](Self::write_blocks)
/// exactly once. Header fields that depend on the body (the wide flag
/// and the body size) are backpatched when the session completes. A
/// failed session leaves the file in an undefined state; callers are
/// expected to discard it and retry the whole export.
pub struct OArchive {
    name: String,
    stream: OStream,
    wide: bool,
    frozen: bool,
}

impl OArchive {
    /// Create a new Cask file, writing a header with placeholder flags
    /// and body size.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let name = path.as_ref().to_string_lossy().to_string();
        let mut stream = OStream::create(&path)?;

        stream.write_bytes(CASK_MAGIC)?;
        stream.write_u8(VERSION_MAJOR)?;
        stream.write_u8(VERSION_MINOR)?;
        stream.write_u16(0)?; // Flags placeholder.
        stream.write_u8(COMPRESSION_NONE)?;
        stream.write_u32(0)?; // Body size placeholder.

        debug!("created archive {}", name);

        Ok(Self {
            name,
            stream,
            wide: false,
            frozen: false,
        })
    }

    /// Archive path as given to [`create`](Self::create).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Select wide (64-bit) encoding for stream payloads. Applies to the
    /// whole body, so it must be chosen before the write session.
    pub fn set_wide(&mut self, wide: bool) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        self.wide = wide;
        Ok(())
    }

    pub fn is_wide(&self) -> bool {
        self.wide
    }

    /// Check whether the write session has completed.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Run the write session: prepare every block, emit them in registry
    /// order, then backpatch the header. Returns the body size in bytes.
    pub fn write_blocks(&mut self, registry: &mut BlockRegistry) -> Result<u32> {
        if self.frozen {
            return Err(Error::Frozen);
        }

        // Derived attribute fields must exist before any length is
        // calculated.
        for block in registry.iter_mut() {
            block.prepare_write()?;
        }

        let body_start = self.stream.pos();
        for (addr, block) in registry.iter() {
            let block_start = self.stream.pos();
            let written = block.write_block(&mut self.stream, self.wide, addr)?;
            debug_assert_eq!(written, self.stream.pos() - block_start);
            trace!(addr, block_type = ?block.block_type(), written, "wrote block");
        }
        let body_size = self.stream.pos() - body_start;
        debug_assert!(body_size <= u64::from(u32::MAX));

        self.frozen = true;

        let mut flags = 0u16;
        if self.wide {
            flags |= HEADER_FLAG_WIDE;
        }
        self.stream.seek(FLAGS_OFFSET as u64)?;
        self.stream.write_u16(flags)?;
        self.stream.seek(BODY_SIZE_OFFSET as u64)?;
        self.stream.write_u32(body_size as u32)?;

        self.stream.seek_end()?;
        self.stream.flush()?;

        debug!(blocks = registry.len(), body_size, "archive body written");

        Ok(body_size as u32)
    }

    /// Finalize and close the archive. An archive that never ran a
    /// write session is closed with an empty body.
    pub fn close(mut self) -> Result<()> {
        if !self.frozen {
            let mut empty = BlockRegistry::new();
            self.write_blocks(&mut empty)?;
        }
        self.stream.flush()?;
        Ok(())
    }
}
