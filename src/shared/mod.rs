/// Shared kernel: error taxonomy, result alias, upload security limits and timestamps
pub mod error;
pub mod result;
pub mod security;
pub mod timestamp;

pub use result::Result;
