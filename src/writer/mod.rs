//! Cask writer: output stream, the block framework and the concrete
//! block kinds.

mod archive;
mod attr;
mod block;
mod mesh;
mod skeleton;
mod stream;
mod write_util;

pub use archive::OArchive;
pub use attr::AttrStore;
pub use block::{Addr, Block, BlockIter, BlockRegistry, NULL_ADDR};
pub use mesh::{MeshData, MeshInst, MeshStream, StreamData, SubMesh};
pub use skeleton::{Joint, Skeleton};
pub use stream::OStream;
