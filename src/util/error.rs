//! Error types for the Cask writer.

use thiserror::Error;

/// Main error type for Cask write operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A reference field still holds the null sentinel at write time
    #[error("Unresolved block reference: {0}")]
    UnresolvedRef(&'static str),

    /// Name does not fit a u16 length prefix
    #[error("Name too long for a length-prefixed string: {0} bytes")]
    NameTooLong(usize),

    /// Attribute value does not fit a u16 length prefix
    #[error("Attribute value for key {key} too large: {len} bytes")]
    AttrTooLarge { key: u16, len: usize },

    /// Archive write session already completed
    #[error("Archive is frozen and cannot be modified")]
    Frozen,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Cask write operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::Frozen;
        assert!(e.to_string().contains("frozen"));

        let e = Error::AttrTooLarge { key: 9, len: 70000 };
        assert!(e.to_string().contains("9"));
        assert!(e.to_string().contains("70000"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
