//! Parameter types for image operations.
//!
//! These types describe *what* to do to an image, not *how*. They are the
//! interface between the [`pass`](crate::pass) module (which decides what to
//! convert) and the [`backend`](super::backend) (which does the pixel work).
//! Keeping them apart lets tests swap in a recording mock backend.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeStyle`] / [`ResizeSpec`]: requested box and how to fit the image into it.
//! - [`CropSpec`]: a pixel region.
//! - [`TransformParam`]: one optional transform, applied in [`TransformParam::ORDER`].
//! - [`TransformPlan`]: the full per-file request (format, resize, parameter list).

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// How a resize request maps onto the source aspect ratio.
///
/// The variants mirror the geometry flags of classic command-line converters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeStyle {
    /// Largest size that fits inside the box, aspect preserved.
    #[default]
    Fit,
    /// Exactly the requested box, aspect ignored (`!`).
    Exact,
    /// Smallest size that covers the box, aspect preserved (`^`).
    Fill,
    /// Like `Fit`, but only when the source is larger than the box (`>`).
    Shrink,
    /// Like `Fit`, but only when the source is smaller than the box (`<`).
    Enlarge,
}

/// A requested resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default, alias = "resizeStyle")]
    pub style: ResizeStyle,
}

/// A rectangular region in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropSpec {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One optional transform step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformParam {
    /// Resolution hint in dots per inch.
    Density(f64),
    /// Gaussian blur sigma.
    Blur(f64),
    /// Clockwise rotation in degrees.
    Rotate(f64),
    /// Mirror top-to-bottom when `true`.
    Flip(bool),
    Quality(Quality),
    /// Remove the uniform border around the subject.
    Trim,
    Crop(CropSpec),
}

/// Discriminant of a [`TransformParam`], used to express ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Density,
    Blur,
    Rotate,
    Flip,
    Quality,
    Trim,
    Crop,
}

impl TransformParam {
    /// Order in which parameters are applied, regardless of how they were
    /// collected.
    pub const ORDER: [TransformKind; 7] = [
        TransformKind::Density,
        TransformKind::Blur,
        TransformKind::Rotate,
        TransformKind::Flip,
        TransformKind::Quality,
        TransformKind::Trim,
        TransformKind::Crop,
    ];

    pub fn kind(&self) -> TransformKind {
        match self {
            TransformParam::Density(_) => TransformKind::Density,
            TransformParam::Blur(_) => TransformKind::Blur,
            TransformParam::Rotate(_) => TransformKind::Rotate,
            TransformParam::Flip(_) => TransformKind::Flip,
            TransformParam::Quality(_) => TransformKind::Quality,
            TransformParam::Trim => TransformKind::Trim,
            TransformParam::Crop(_) => TransformKind::Crop,
        }
    }

    fn rank(&self) -> usize {
        let kind = self.kind();
        Self::ORDER
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(Self::ORDER.len())
    }
}

/// Everything the backend needs to convert one file.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    /// Output format identifier, e.g. `jpg`, `webp`.
    pub format: String,
    pub resize: Option<ResizeSpec>,
    /// Sorted by [`TransformParam::ORDER`].
    pub params: Vec<TransformParam>,
}

impl TransformPlan {
    /// Build a plan, sorting `params` into application order.
    pub fn new(
        format: impl Into<String>,
        resize: Option<ResizeSpec>,
        mut params: Vec<TransformParam>,
    ) -> Self {
        params.sort_by_key(TransformParam::rank);
        Self {
            format: format.into(),
            resize,
            params,
        }
    }
}
