//! Pure Rust image backend built on the `image` crate.
//!
//! Everything is statically linked into the binary; all work happens on
//! in-memory buffers.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, box from [`calculations`](super::calculations) |
//! | Blur | `DynamicImage::blur` (gaussian) |
//! | Rotate / Flip | `rotate90/180/270`, `flipv` |
//! | Trim / Crop | `DynamicImage::crop_imm` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality`, JFIF density from `Density` |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6) |
//! | Encode → others | `DynamicImage::write_to` |
//! | Probe | `ImageReader::into_dimensions` (header only) |
//!
//! AVIF is encode-only: the `image` crate's `"avif"` feature compiles the
//! rav1e encoder but no decoder.

use super::backend::{AdapterError, Dimensions, ImageBackend};
use super::calculations::{calculate_resize_dimensions, clip_crop, quarter_turns};
use super::params::{CropSpec, Quality, ResizeSpec, TransformParam};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded image plus the encoding settings accumulated by transforms.
pub struct Working {
    image: DynamicImage,
    quality: Quality,
    /// Dots per inch. Written to the JFIF header of JPEG output; other
    /// encoders here have no density field and drop it.
    density: Option<f64>,
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, std::io::Error> {
    ImageReader::new(Cursor::new(bytes)).with_guessed_format()
}

/// Bounding box of pixels that differ from the top-left corner pixel.
fn trim_bounds(img: &DynamicImage) -> Option<CropSpec> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let background = img.get_pixel(0, 0);
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0, 0);
    for (x, y, px) in img.pixels() {
        if px != background {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x || min_y > max_y {
        return None;
    }
    Some(CropSpec {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

fn encode_error(format: &str, e: image::ImageError) -> AdapterError {
    AdapterError::Encode(format!("{format}: {e}"))
}

impl ImageBackend for RustBackend {
    type Handle = Working;

    fn decode(&self, bytes: &[u8]) -> Result<Working, AdapterError> {
        let image = reader(bytes)
            .map_err(|e| AdapterError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| AdapterError::Decode(e.to_string()))?;
        Ok(Working {
            image,
            quality: Quality::default(),
            density: None,
        })
    }

    fn resize(&self, mut handle: Working, spec: &ResizeSpec) -> Result<Working, AdapterError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(AdapterError::Transform(format!(
                "resize target {}x{} has a zero edge",
                spec.width, spec.height
            )));
        }
        let (w, h) = calculate_resize_dimensions(
            handle.image.dimensions(),
            (spec.width, spec.height),
            spec.style,
        );
        if (w, h) != handle.image.dimensions() {
            handle.image = handle.image.resize_exact(w, h, FilterType::Lanczos3);
        }
        Ok(handle)
    }

    fn apply(&self, mut handle: Working, param: &TransformParam) -> Result<Working, AdapterError> {
        match *param {
            TransformParam::Density(dpi) => {
                if dpi <= 0.0 {
                    return Err(AdapterError::Transform(format!(
                        "density must be positive, got {dpi}"
                    )));
                }
                handle.density = Some(dpi);
            }
            TransformParam::Blur(sigma) => {
                if sigma > 0.0 {
                    handle.image = handle.image.blur(sigma as f32);
                }
            }
            TransformParam::Rotate(degrees) => {
                let turns = quarter_turns(degrees).ok_or_else(|| {
                    AdapterError::Transform(format!(
                        "rotation by {degrees} degrees is not a multiple of 90"
                    ))
                })?;
                handle.image = match turns {
                    1 => handle.image.rotate90(),
                    2 => handle.image.rotate180(),
                    3 => handle.image.rotate270(),
                    _ => handle.image,
                };
            }
            TransformParam::Flip(true) => handle.image = handle.image.flipv(),
            TransformParam::Flip(false) => {}
            TransformParam::Quality(q) => handle.quality = q,
            TransformParam::Trim => {
                if let Some(b) = trim_bounds(&handle.image) {
                    handle.image = handle.image.crop_imm(b.x, b.y, b.width, b.height);
                }
            }
            TransformParam::Crop(crop) => {
                let region = clip_crop(handle.image.dimensions(), &crop).ok_or_else(|| {
                    AdapterError::Transform(format!(
                        "crop {}x{}+{}+{} lies outside the image",
                        crop.width, crop.height, crop.x, crop.y
                    ))
                })?;
                handle.image =
                    handle
                        .image
                        .crop_imm(region.x, region.y, region.width, region.height);
            }
        }
        Ok(handle)
    }

    fn encode(&self, handle: Working, format: &str) -> Result<Vec<u8>, AdapterError> {
        let id = format.trim_start_matches('.').to_lowercase();
        let quality = handle.quality.value();
        let mut buf = Vec::new();
        match id.as_str() {
            "jpg" | "jpeg" => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(handle.image.to_rgb8());
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
                if let Some(dpi) = handle.density {
                    let dpi = dpi.round().clamp(1.0, f64::from(u16::MAX)) as u16;
                    encoder.set_pixel_density(PixelDensity::dpi(dpi));
                }
                rgb.write_with_encoder(encoder)
                    .map_err(|e| encode_error(&id, e))?;
            }
            "avif" => {
                let encoder = AvifEncoder::new_with_speed_quality(&mut buf, 6, quality);
                handle
                    .image
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(&id, e))?;
            }
            other => {
                let fmt = ImageFormat::from_extension(other)
                    .filter(|f| f.writing_enabled())
                    .ok_or_else(|| AdapterError::UnsupportedFormat(other.to_string()))?;
                handle
                    .image
                    .write_to(&mut Cursor::new(&mut buf), fmt)
                    .map_err(|e| encode_error(&id, e))?;
            }
        }
        Ok(buf)
    }

    fn probe_dimensions(&self, bytes: &[u8]) -> Result<Dimensions, AdapterError> {
        let (width, height) = reader(bytes)
            .map_err(|e| AdapterError::Probe(e.to_string()))?
            .into_dimensions()
            .map_err(|e| AdapterError::Probe(e.to_string()))?;
        Ok(Dimensions { width, height })
    }
}
