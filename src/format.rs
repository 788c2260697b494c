//! Cask container and block wire constants.
//!
//! All multi-byte fields in a Cask file are big-endian. The container is
//! a 12-byte header followed by a flat chain of length-prefixed blocks.

/// Magic bytes at the start of a Cask file.
pub const CASK_MAGIC: &[u8; 3] = b"CSK";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Offset of the version (major u8, minor u8) in the header.
pub const VERSION_OFFSET: usize = 3;

/// Offset of the u16 header flags field.
pub const FLAGS_OFFSET: usize = 5;

/// Offset of the compression tag in the header.
pub const COMPRESSION_OFFSET: usize = 7;

/// Offset of the u32 body size field, backpatched when the write
/// session completes.
pub const BODY_SIZE_OFFSET: usize = 8;

/// Format version written by this crate.
pub const VERSION_MAJOR: u8 = 1;

/// Minor part of the format version.
pub const VERSION_MINOR: u8 = 0;

/// Header flag bit: numeric stream payloads use the wide (64-bit) width.
pub const HEADER_FLAG_WIDE: u16 = 0x0001;

/// Compression tag for an uncompressed body, the only mode this writer
/// emits.
pub const COMPRESSION_NONE: u8 = 0;

/// Size of the per-block header: address u32, flags u8, type tag u8,
/// body length u32.
pub const BLOCK_HEADER_SIZE: u32 = 10;

/// Block flag bit: the body was encoded with the wide width.
pub const BLOCK_FLAG_WIDE: u8 = 0x01;

/// Size of the fixed per-stream header: type tag u8 + payload byte
/// length u32.
pub const STREAM_HEADER_SIZE: u32 = 5;

/// Fixed bytes per sub-mesh: material address u32 + sub-mesh byte
/// length u32.
pub const SUB_MESH_HEADER_SIZE: u32 = 8;

/// Serialized size of a 4x4 double-precision matrix.
pub const MTX4_SIZE: u32 = 128;

/// Reserved property key: skeleton block address on a mesh data block.
pub const PROP_MESH_SKELETON: u16 = 1;

/// Reserved property key: bind matrix on a mesh data block.
pub const PROP_MESH_BIND_MTX: u16 = 2;

/// Block type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockType {
    /// Scene placement of a mesh data block.
    MeshInstance = 3,
    /// Mesh geometry: sub-meshes and their data streams.
    MeshData = 4,
    /// Joint hierarchy with bind-pose matrices.
    Skeleton = 60,
}

/// Stream type tags describing what a mesh data stream holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamType {
    /// Vertex positions.
    Vertex = 1,
    /// Triangle indices.
    Triangle = 2,
    /// Texture coordinates.
    Uv = 3,
    /// Per-vertex skinning weights.
    VertexWeights = 7,
}

/// Value type tags for attribute store entries.
///
/// The tag is staging metadata for the producer side; consumers derive
/// value interpretation from the key, so only the key and raw bytes go
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttrType {
    Uint16 = 1,
    Uint32 = 2,
    Float64 = 3,
    /// Block address reference.
    Baddr = 4,
    /// 4x4 double-precision matrix.
    Mtx4 = 5,
    String = 6,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic() {
        assert_eq!(CASK_MAGIC, b"CSK");
        assert_eq!(CASK_MAGIC.len(), 3);
    }

    #[test]
    fn test_header_layout() {
        // magic + version + flags + compression + body size
        let size = 3 + 2 + 2 + 1 + 4;
        assert_eq!(size, HEADER_SIZE);
        assert_eq!(FLAGS_OFFSET, VERSION_OFFSET + 2);
        assert_eq!(COMPRESSION_OFFSET, FLAGS_OFFSET + 2);
        assert_eq!(BODY_SIZE_OFFSET, COMPRESSION_OFFSET + 1);
    }

    #[test]
    fn test_block_header_size() {
        assert_eq!(BLOCK_HEADER_SIZE, 4 + 1 + 1 + 4);
    }
}
