//! Skeleton block: a named joint hierarchy with bind-pose matrices.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use glam::DMat4;

use crate::format::{BlockType, MTX4_SIZE};
use crate::util::Result;
use crate::writer::attr::AttrStore;
use crate::writer::block::Block;
use crate::writer::write_util::{var_str_len, write_mtx4, write_var_str};

/// One joint in a skeleton. Joint ids are 1-based in append order;
/// parent id 0 marks a root joint.
#[derive(Debug, Clone)]
pub struct Joint {
    name: String,
    parent_id: u32,
    inverse_bind: DMat4,
}

impl Joint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> u32 {
        self.parent_id
    }

    pub fn inverse_bind(&self) -> &DMat4 {
        &self.inverse_bind
    }
}

/// Skeleton block referenced by mesh data blocks.
pub struct Skeleton {
    name: String,
    joints: Vec<Joint>,
    properties: AttrStore,
    user_attributes: AttrStore,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joints: Vec::new(),
            properties: AttrStore::new(),
            user_attributes: AttrStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a joint and return its 1-based id. Identity is used when
    /// no inverse bind matrix is supplied.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        parent_id: u32,
        inverse_bind: Option<DMat4>,
    ) -> u32 {
        self.joints.push(Joint {
            name: name.into(),
            parent_id,
            inverse_bind: inverse_bind.unwrap_or(DMat4::IDENTITY),
        });
        self.joints.len() as u32
    }

    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Joints in append order.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Caller-defined attributes, written as the trailing section.
    pub fn user_attributes_mut(&mut self) -> &mut AttrStore {
        &mut self.user_attributes
    }
}

impl Block for Skeleton {
    fn block_type(&self) -> BlockType {
        BlockType::Skeleton
    }

    fn calc_body_length(&self, _wide: bool) -> u32 {
        let mut len = var_str_len(&self.name) + 4; // name + joint count
        len += self.properties.calc_length();
        for joint in &self.joints {
            len += 8 + var_str_len(&joint.name) + MTX4_SIZE;
        }
        len + self.user_attributes.calc_length()
    }

    fn write_body(&self, out: &mut dyn Write, _wide: bool) -> Result<()> {
        write_var_str(out, &self.name)?;
        out.write_u32::<BigEndian>(self.joints.len() as u32)?;
        self.properties.write(out)?;
        for (idx, joint) in self.joints.iter().enumerate() {
            out.write_u32::<BigEndian>(idx as u32 + 1)?;
            out.write_u32::<BigEndian>(joint.parent_id)?;
            write_var_str(out, &joint.name)?;
            write_mtx4(out, &joint.inverse_bind)?;
        }
        self.user_attributes.write(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_ids_in_append_order() {
        let mut skel = Skeleton::new("rig");
        let root = skel.add_joint("root", 0, None);
        let spine = skel.add_joint("spine", root, None);
        assert_eq!((root, spine), (1, 2));
        assert_eq!(skel.num_joints(), 2);
        assert_eq!(skel.joints()[1].parent_id(), root);
        assert_eq!(skel.joints()[0].inverse_bind(), &DMat4::IDENTITY);
    }

    #[test]
    fn test_joint_count_field() {
        let mut skel = Skeleton::new("rig");
        skel.add_joint("root", 0, None);

        let mut buf = Vec::new();
        skel.write_body(&mut buf, false).unwrap();
        // Name "rig", then the u32 joint count.
        assert_eq!(&buf[0..2], &[0, 3]);
        assert_eq!(&buf[5..9], &[0, 0, 0, 1]);
    }
}
