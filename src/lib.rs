//! # Cask
//!
//! Writer for the Cask (.csk) block-structured binary scene format,
//! used to hand meshes, instance transforms and skeletons to an
//! external runtime.
//!
//! A Cask file is a 12-byte container header followed by a flat chain
//! of self-describing blocks. Every block declares its body length up
//! front, so consumers can skip block kinds they do not understand;
//! blocks reference each other through addresses assigned in registry
//! order. All multi-byte fields are big-endian.
//!
//! ## Modules
//!
//! - [`util`] - error types
//! - [`format`] - wire constants (header layout, type tags, reserved keys)
//! - [`writer`] - output stream, block framework, concrete block kinds
//!
//! ## Example
//!
//! ```ignore
//! use cask::prelude::*;
//!
//! let mut sub = SubMesh::new();
//! sub.add_stream(StreamType::Vertex, StreamData::Float(positions));
//! sub.add_stream(StreamType::Triangle, StreamData::Index(indices));
//!
//! let mut mesh = MeshData::new("cube");
//! mesh.add_sub_mesh(sub);
//!
//! let mut registry = BlockRegistry::new();
//! let mesh_addr = registry.append(Box::new(mesh));
//! registry.append(Box::new(MeshInst::new("cube_1", mesh_addr)));
//!
//! let mut archive = OArchive::create("scene.csk")?;
//! archive.write_blocks(&mut registry)?;
//! archive.close()?;
//! ```

pub mod format;
pub mod util;
pub mod writer;

// Re-export commonly used types
pub use util::{Error, Result};
pub use writer::{BlockRegistry, OArchive};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::format::{AttrType, BlockType, StreamType};
    pub use crate::util::{Error, Result};
    pub use crate::writer::{
        Addr, AttrStore, Block, BlockIter, BlockRegistry, Joint, MeshData, MeshInst, MeshStream,
        OArchive, OStream, Skeleton, StreamData, SubMesh, NULL_ADDR,
    };
}
