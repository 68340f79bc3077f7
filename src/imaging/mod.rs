//! Image transform adapter, pure Rust and in-memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from bytes) |
//! | **Resize** | Lanczos3, geometry from [`calculations`] |
//! | **Transforms** | density, blur, rotate, flip, quality, trim, crop |
//! | **Encode** | JPEG/AVIF with quality, other formats via `write_to` |
//! | **Probe** | `ImageReader::into_dimensions` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
pub mod params;
pub mod rust_backend;

pub use backend::{AdapterError, Dimensions, ImageBackend};
pub use params::{CropSpec, Quality, ResizeSpec, ResizeStyle, TransformParam, TransformPlan};
pub use rust_backend::RustBackend;

/// Run a full [`TransformPlan`] against `source`: decode, optional resize,
/// each parameter in order, encode.
pub fn run_plan<B: ImageBackend>(
    backend: &B,
    source: &[u8],
    plan: &TransformPlan,
) -> Result<Vec<u8>, AdapterError> {
    let mut handle = backend.decode(source)?;
    if let Some(resize) = &plan.resize {
        log::debug!("Resizing ({}x{})", resize.width, resize.height);
        handle = backend.resize(handle, resize)?;
    }
    for param in &plan.params {
        handle = backend.apply(handle, param)?;
    }
    backend.encode(handle, &plan.format)
}
