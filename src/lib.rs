//! Bookworm application library
//!
//! The reading-tracker domain (personal library and catalog search) packaged
//! as Bookworm modules.

pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
