//! Mesh geometry blocks: data streams, sub-meshes, mesh data and mesh
//! instances.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use glam::DMat4;
use smallvec::SmallVec;

use crate::format::{
    BlockType, StreamType, MTX4_SIZE, PROP_MESH_BIND_MTX, PROP_MESH_SKELETON, STREAM_HEADER_SIZE,
    SUB_MESH_HEADER_SIZE,
};
use crate::util::{Error, Result};
use crate::writer::attr::AttrStore;
use crate::writer::block::{Addr, Block, NULL_ADDR};
use crate::writer::write_util::{var_str_len, write_mtx4, write_var_str};

/// Raw elements of one mesh data stream.
///
/// The encoded width is not a property of the data itself: float
/// elements go out as f64 or f32 and index elements as u32 or u16
/// depending on the session's wide flag.
#[derive(Debug, Clone)]
pub enum StreamData {
    /// Floating-point elements (positions, UVs, weights).
    Float(Vec<f64>),
    /// Integer index elements (triangle lists).
    Index(Vec<u32>),
}

impl StreamData {
    /// Number of raw elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Index(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn elem_size(&self, wide: bool) -> u32 {
        match (self, wide) {
            (Self::Float(_), true) => 8,
            (Self::Float(_), false) => 4,
            (Self::Index(_), true) => 4,
            (Self::Index(_), false) => 2,
        }
    }
}

/// One typed, contiguous run of numeric elements inside a sub-mesh.
#[derive(Debug, Clone)]
pub struct MeshStream {
    kind: StreamType,
    data: StreamData,
}

impl MeshStream {
    pub fn new(kind: StreamType, data: StreamData) -> Self {
        Self { kind, data }
    }

    pub fn kind(&self) -> StreamType {
        self.kind
    }

    /// Number of raw elements in the stream.
    pub fn num_elements(&self) -> usize {
        self.data.len()
    }

    /// Payload size in bytes, a pure function of the element count and
    /// the chosen width.
    pub fn byte_length(&self, wide: bool) -> u32 {
        self.data.len() as u32 * self.data.elem_size(wide)
    }

    /// Emit the 5-byte stream header and the payload.
    fn write(&self, out: &mut dyn Write, wide: bool) -> Result<()> {
        out.write_u8(self.kind as u8)?;
        out.write_u32::<BigEndian>(self.byte_length(wide))?;
        match &self.data {
            StreamData::Float(values) => {
                for &v in values {
                    if wide {
                        out.write_f64::<BigEndian>(v)?;
                    } else {
                        out.write_f32::<BigEndian>(v as f32)?;
                    }
                }
            }
            StreamData::Index(values) => {
                for &v in values {
                    if wide {
                        out.write_u32::<BigEndian>(v)?;
                    } else {
                        out.write_u16::<BigEndian>(v as u16)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ordered group of streams sharing one material reference.
#[derive(Debug, Clone, Default)]
pub struct SubMesh {
    material: Addr,
    streams: SmallVec<[MeshStream; 4]>,
}

impl SubMesh {
    pub fn new() -> Self {
        Self {
            material: NULL_ADDR,
            streams: SmallVec::new(),
        }
    }

    /// Stage the material block address. Left at [`NULL_ADDR`], the
    /// field goes out as the no-reference sentinel.
    pub fn set_material(&mut self, material: Addr) {
        self.material = material;
    }

    pub fn material(&self) -> Addr {
        self.material
    }

    /// Append a stream; the sub-mesh takes ownership of the data.
    pub fn add_stream(&mut self, kind: StreamType, data: StreamData) {
        self.streams.push(MeshStream::new(kind, data));
    }

    /// Streams in append order.
    pub fn streams(&self) -> &[MeshStream] {
        &self.streams
    }

    /// Total encoded size of all streams, headers included. A sub-mesh
    /// with no streams has length 0.
    pub fn byte_length(&self, wide: bool) -> u32 {
        self.streams
            .iter()
            .map(|s| STREAM_HEADER_SIZE + s.byte_length(wide))
            .sum()
    }

    fn write(&self, out: &mut dyn Write, wide: bool) -> Result<()> {
        out.write_u32::<BigEndian>(self.material)?;
        out.write_u32::<BigEndian>(self.byte_length(wide))?;
        for stream in &self.streams {
            stream.write(out, wide)?;
        }
        Ok(())
    }
}

/// Mesh geometry block: named, owns its sub-meshes, optionally bound to
/// a skeleton.
pub struct MeshData {
    name: String,
    subs: Vec<SubMesh>,
    skeleton: Option<Addr>,
    bind_mtx: Option<DMat4>,
    properties: AttrStore,
    user_attributes: AttrStore,
}

impl MeshData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subs: Vec::new(),
            skeleton: None,
            bind_mtx: None,
            properties: AttrStore::new(),
            user_attributes: AttrStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a sub-mesh; ownership transfers to the block.
    pub fn add_sub_mesh(&mut self, sub: SubMesh) {
        self.subs.push(sub);
    }

    /// Number of sub-meshes.
    pub fn num_subs(&self) -> usize {
        self.subs.len()
    }

    /// Sub-mesh at the given append position, or `None` when out of
    /// range.
    pub fn sub_at(&self, idx: usize) -> Option<&SubMesh> {
        self.subs.get(idx)
    }

    /// Bind this mesh to a skeleton block by registry address.
    pub fn set_skeleton(&mut self, skeleton: Addr) {
        self.skeleton = Some(skeleton);
    }

    pub fn skeleton(&self) -> Option<Addr> {
        self.skeleton
    }

    /// Set the bind-pose matrix used with the skeleton. When a skeleton
    /// is attached and no matrix was supplied, identity is synthesized
    /// during the prepare pass.
    pub fn set_bind_mtx(&mut self, mtx: DMat4) {
        self.bind_mtx = Some(mtx);
    }

    pub fn bind_mtx(&self) -> Option<&DMat4> {
        self.bind_mtx.as_ref()
    }

    /// Framework-reserved properties staged for this block.
    pub fn properties(&self) -> &AttrStore {
        &self.properties
    }

    /// Caller-defined attributes, written as the trailing section.
    pub fn user_attributes_mut(&mut self) -> &mut AttrStore {
        &mut self.user_attributes
    }
}

impl Block for MeshData {
    fn block_type(&self) -> BlockType {
        BlockType::MeshData
    }

    /// Materialize the skeleton address and bind matrix into the
    /// property store, so the length pass that follows counts them.
    /// Idempotent: staging replaces prior values.
    fn prepare_write(&mut self) -> Result<()> {
        if let Some(skeleton) = self.skeleton {
            if skeleton == NULL_ADDR {
                return Err(Error::UnresolvedRef("mesh data skeleton"));
            }
            self.properties.set_addr(PROP_MESH_SKELETON, skeleton)?;
            let bind_mtx = *self.bind_mtx.get_or_insert(DMat4::IDENTITY);
            self.properties.set_mtx4(PROP_MESH_BIND_MTX, &bind_mtx)?;
        }
        Ok(())
    }

    fn calc_body_length(&self, wide: bool) -> u32 {
        let mut len = 2; // sub-mesh count
        len += var_str_len(&self.name);
        len += self.properties.calc_length();
        len += self.user_attributes.calc_length();
        for sub in &self.subs {
            len += SUB_MESH_HEADER_SIZE + sub.byte_length(wide);
        }
        len
    }

    fn write_body(&self, out: &mut dyn Write, wide: bool) -> Result<()> {
        write_var_str(out, &self.name)?;
        out.write_u16::<BigEndian>(self.subs.len() as u16)?;
        self.properties.write(out)?;
        for sub in &self.subs {
            sub.write(out, wide)?;
        }
        self.user_attributes.write(out)
    }
}

/// Scene placement of one mesh data block.
///
/// The mesh data address is captured at construction, so the referenced
/// block must already be in the registry. The parent scene-node address
/// defaults to the no-reference sentinel.
pub struct MeshInst {
    name: String,
    data: Addr,
    parent: Addr,
    transform: DMat4,
}

impl MeshInst {
    /// Create an instance of the mesh data block at `data` with an
    /// identity transform.
    pub fn new(name: impl Into<String>, data: Addr) -> Self {
        Self {
            name: name.into(),
            data,
            parent: NULL_ADDR,
            transform: DMat4::IDENTITY,
        }
    }

    /// Create an instance with an explicit placement transform.
    pub fn with_transform(name: impl Into<String>, data: Addr, transform: DMat4) -> Self {
        Self {
            transform,
            ..Self::new(name, data)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address of the referenced mesh data block.
    pub fn data(&self) -> Addr {
        self.data
    }

    /// Stage the parent scene-node address.
    pub fn set_parent(&mut self, parent: Addr) {
        self.parent = parent;
    }

    pub fn parent(&self) -> Addr {
        self.parent
    }

    pub fn set_transform(&mut self, transform: DMat4) {
        self.transform = transform;
    }

    pub fn transform(&self) -> &DMat4 {
        &self.transform
    }
}

impl Block for MeshInst {
    fn block_type(&self) -> BlockType {
        BlockType::MeshInstance
    }

    fn calc_body_length(&self, _wide: bool) -> u32 {
        // Parent ref + transform + mesh data ref, plus the name.
        4 + MTX4_SIZE + 4 + var_str_len(&self.name)
    }

    fn write_body(&self, out: &mut dyn Write, _wide: bool) -> Result<()> {
        if self.data == NULL_ADDR {
            return Err(Error::UnresolvedRef("mesh instance data"));
        }
        out.write_u32::<BigEndian>(self.parent)?;
        write_mtx4(out, &self.transform)?;
        write_var_str(out, &self.name)?;
        out.write_u32::<BigEndian>(self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_byte_length_by_width() {
        let floats = MeshStream::new(StreamType::Vertex, StreamData::Float(vec![0.0; 6]));
        assert_eq!(floats.byte_length(false), 24);
        assert_eq!(floats.byte_length(true), 48);

        let indices = MeshStream::new(StreamType::Triangle, StreamData::Index(vec![0; 6]));
        assert_eq!(indices.byte_length(false), 12);
        assert_eq!(indices.byte_length(true), 24);
    }

    #[test]
    fn test_stream_write_narrow_indices() {
        let stream = MeshStream::new(StreamType::Triangle, StreamData::Index(vec![1, 2, 3]));
        let mut buf = Vec::new();
        stream.write(&mut buf, false).unwrap();

        assert_eq!(buf[0], StreamType::Triangle as u8);
        assert_eq!(&buf[1..5], &[0, 0, 0, 6]);
        assert_eq!(&buf[5..], &[0, 1, 0, 2, 0, 3]);
    }

    #[test]
    fn test_empty_sub_mesh_length() {
        let sub = SubMesh::new();
        assert_eq!(sub.byte_length(false), 0);
        assert_eq!(sub.byte_length(true), 0);

        let mut buf = Vec::new();
        sub.write(&mut buf, false).unwrap();
        assert_eq!(buf, [0; 8]);
    }

    #[test]
    fn test_sub_mesh_lookup() {
        let mut mesh = MeshData::new("m");
        assert_eq!(mesh.num_subs(), 0);
        assert!(mesh.sub_at(0).is_none());

        let mut sub = SubMesh::new();
        sub.add_stream(StreamType::Vertex, StreamData::Float(vec![0.0; 3]));
        mesh.add_sub_mesh(sub);
        mesh.add_sub_mesh(SubMesh::new());

        assert_eq!(mesh.num_subs(), 2);
        assert_eq!(mesh.sub_at(0).unwrap().streams().len(), 1);
        assert_eq!(mesh.sub_at(1).unwrap().streams().len(), 0);
        assert!(mesh.sub_at(2).is_none());
    }

    #[test]
    fn test_prepare_write_without_skeleton_stages_nothing() {
        let mut mesh = MeshData::new("m");
        mesh.prepare_write().unwrap();
        assert!(mesh.properties().is_empty());
        assert!(mesh.bind_mtx().is_none());
    }

    #[test]
    fn test_unresolved_skeleton_rejected() {
        let mut mesh = MeshData::new("m");
        mesh.set_skeleton(NULL_ADDR);
        assert!(matches!(
            mesh.prepare_write(),
            Err(Error::UnresolvedRef(_))
        ));
    }
}
