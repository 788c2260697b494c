//! Basic shared types for the Cask writer.

pub mod error;

pub use error::{Error, Result};
