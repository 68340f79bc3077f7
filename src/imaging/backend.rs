//! Image transform backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only boundary between conversion logic
//! and pixel work. Every backend supports five operations:
//!
//! | Operation | Input | Output |
//! |---|---|---|
//! | `decode` | encoded bytes | working handle |
//! | `resize` | handle + [`ResizeSpec`] | handle |
//! | `apply` | handle + [`TransformParam`] | handle |
//! | `encode` | handle + format id | encoded bytes |
//! | `probe_dimensions` | encoded bytes | [`Dimensions`] |
//!
//! Handles are consumed and returned so a backend can transform in place.
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{ResizeSpec, TransformParam};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Transform failed: {0}")]
    Transform(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to read dimensions: {0}")]
    Probe(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image transform backends.
///
/// Must be `Sync`: one backend instance is shared by every rayon worker of
/// every pass.
pub trait ImageBackend: Sync {
    /// Decoded, in-progress image.
    type Handle: Send;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Handle, AdapterError>;

    fn resize(&self, handle: Self::Handle, spec: &ResizeSpec)
    -> Result<Self::Handle, AdapterError>;

    fn apply(
        &self,
        handle: Self::Handle,
        param: &TransformParam,
    ) -> Result<Self::Handle, AdapterError>;

    /// Encode to `format` (an identifier such as `jpg` or `webp`).
    fn encode(&self, handle: Self::Handle, format: &str) -> Result<Vec<u8>, AdapterError>;

    /// Read dimensions from encoded bytes without a full decode.
    fn probe_dimensions(&self, bytes: &[u8]) -> Result<Dimensions, AdapterError>;
}
