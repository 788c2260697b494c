//! Shared field encoders used by both length calculation and body
//! writing, so the two phases cannot disagree on a field's size.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use glam::DMat4;

use crate::format::MTX4_SIZE;
use crate::util::{Error, Result};

/// Serialized size of a length-prefixed string: u16 prefix + raw bytes.
#[inline]
pub fn var_str_len(name: &str) -> u32 {
    2 + name.len() as u32
}

/// Write a length-prefixed string: u16 big-endian byte length, then the
/// raw UTF-8 bytes, no terminator.
pub fn write_var_str<W: Write + ?Sized>(out: &mut W, name: &str) -> Result<()> {
    if name.len() > u16::MAX as usize {
        return Err(Error::NameTooLong(name.len()));
    }
    out.write_u16::<BigEndian>(name.len() as u16)?;
    out.write_all(name.as_bytes())?;
    Ok(())
}

/// Write a 4x4 matrix as 16 f64 values, column-major, big-endian.
pub fn write_mtx4<W: Write + ?Sized>(out: &mut W, mtx: &DMat4) -> Result<()> {
    for v in mtx.to_cols_array() {
        out.write_f64::<BigEndian>(v)?;
    }
    Ok(())
}

/// Encode a 4x4 matrix into the byte form used for attribute values.
pub fn mtx4_bytes(mtx: &DMat4) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MTX4_SIZE as usize);
    for v in mtx.to_cols_array() {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_str() {
        let mut buf = Vec::new();
        write_var_str(&mut buf, "cube").unwrap();
        assert_eq!(buf, [0, 4, b'c', b'u', b'b', b'e']);
        assert_eq!(buf.len() as u32, var_str_len("cube"));

        let mut buf = Vec::new();
        write_var_str(&mut buf, "").unwrap();
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn test_mtx4_identity() {
        let bytes = mtx4_bytes(&DMat4::IDENTITY);
        assert_eq!(bytes.len() as u32, MTX4_SIZE);
        // First column starts with 1.0.
        assert_eq!(&bytes[0..8], &1.0f64.to_be_bytes());
        assert_eq!(&bytes[8..16], &0.0f64.to_be_bytes());

        let mut buf = Vec::new();
        write_mtx4(&mut buf, &DMat4::IDENTITY).unwrap();
        assert_eq!(buf, bytes);
    }
}
