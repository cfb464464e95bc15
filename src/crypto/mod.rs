pub mod digest;
pub mod sha256;

pub use digest::Digest;
pub use sha256::{Sha256, sha256};

/// Size in bytes of a SHA-256 digest.
pub const DIGEST_SIZE: usize = 32;

/// Size in bytes of one SHA-256 message block.
pub const BLOCK_SIZE: usize = 64;
