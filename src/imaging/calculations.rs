//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropSpec, ResizeStyle};

/// Calculate dimensions that fit inside a target box, preserving aspect.
///
/// One dimension matches the box exactly, the other is less than or equal.
///
/// ```
/// # use imgconv::imaging::calculations::calculate_fit_dimensions;
/// // 400x300 into 200x200 → width-bound
/// assert_eq!(calculate_fit_dimensions((400, 300), (200, 200)), (200, 150));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    scale_by(source, fit_ratio(source, target))
}

/// Calculate dimensions needed to fill a target area.
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    let ratio = (tgt_w as f64 / src_w.max(1) as f64).max(tgt_h as f64 / src_h.max(1) as f64);
    scale_by(source, ratio)
}

/// Final output dimensions for a resize request in the given style.
///
/// `Shrink` and `Enlarge` return the source unchanged when the condition
/// does not hold.
pub fn calculate_resize_dimensions(
    source: (u32, u32),
    target: (u32, u32),
    style: ResizeStyle,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    match style {
        ResizeStyle::Fit => calculate_fit_dimensions(source, target),
        ResizeStyle::Exact => (tgt_w.max(1), tgt_h.max(1)),
        ResizeStyle::Fill => calculate_fill_dimensions(source, target),
        ResizeStyle::Shrink if src_w > tgt_w || src_h > tgt_h => {
            calculate_fit_dimensions(source, target)
        }
        ResizeStyle::Enlarge if src_w < tgt_w && src_h < tgt_h => {
            calculate_fit_dimensions(source, target)
        }
        ResizeStyle::Shrink | ResizeStyle::Enlarge => source,
    }
}

/// Normalize a rotation in degrees to a quarter-turn count (0-3).
///
/// Returns `None` when the angle is not a finite multiple of 90°.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    if !degrees.is_finite() {
        return None;
    }
    let normalized = degrees.rem_euclid(360.0);
    let turns = normalized / 90.0;
    if (turns - turns.round()).abs() > 1e-9 {
        return None;
    }
    Some((turns.round() as u8) % 4)
}

/// Clip a crop region against image bounds.
///
/// Returns `None` if nothing of the region lies inside the image.
pub fn clip_crop(image: (u32, u32), crop: &CropSpec) -> Option<CropSpec> {
    let (img_w, img_h) = image;
    if crop.x >= img_w || crop.y >= img_h || crop.width == 0 || crop.height == 0 {
        return None;
    }
    Some(CropSpec {
        x: crop.x,
        y: crop.y,
        width: crop.width.min(img_w - crop.x),
        height: crop.height.min(img_h - crop.y),
    })
}

fn fit_ratio(source: (u32, u32), target: (u32, u32)) -> f64 {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    (tgt_w as f64 / src_w.max(1) as f64).min(tgt_h as f64 / src_h.max(1) as f64)
}

fn scale_by(source: (u32, u32), ratio: f64) -> (u32, u32) {
    let (src_w, src_h) = source;
    let w = (src_w as f64 * ratio).round().max(1.0) as u32;
    let h = (src_h as f64 * ratio).round().max(1.0) as u32;
    (w, h)
}
