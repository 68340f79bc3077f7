//! # imgconv
//!
//! Batch image conversion over an in-memory file collection. Files are
//! selected by glob, converted to a target format (optionally resized,
//! rotated, cropped, blurred, trimmed or re-compressed), renamed from a
//! template, and written back into the same collection.
//!
//! # Architecture: Passes Over One Collection
//!
//! A run is one or more *passes*. Every pass sweeps the whole collection; all
//! passes of a run execute concurrently and share two structures:
//!
//! ```text
//! FileCollection   path → { contents, image_size, metadata }   (caller-owned)
//! ResultSet        paths produced during this run               (per call)
//! ```
//!
//! A pass never converts a path that is in the result set, so a
//! `png → jpg` pass and a `jpg → webp` pass in the same run do not chain.
//!
//! ```rust,no_run
//! use imgconv::collection::{FileCollection, FileRecord};
//! use imgconv::config::PassConfig;
//!
//! let files = FileCollection::new();
//! files.insert("photos/dawn.png", FileRecord::new(std::fs::read("dawn.png")?));
//!
//! imgconv::convert::convert(
//!     vec![PassConfig::new("**/*.png", "jpg"), PassConfig::new("**/*.jpg", "webp")],
//!     &files,
//! )?;
//! assert!(files.contains("photos/dawn.jpg"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`convert`] | Entry point: runs passes concurrently, reports the first error |
//! | [`pass`] | One pass: glob selection, per-file conversion, error aggregation |
//! | [`naming`] | Output filename templates (`%b`, `%e`, `%x`, `%y`) |
//! | [`imaging`] | Backend trait and the pure-Rust `image` crate backend |
//! | [`collection`] | Concurrency-safe file collection and result set |
//! | [`config`] | Pass configuration and TOML config file loading |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Typed Transforms
//!
//! Optional transforms are a closed enum ([`imaging::TransformParam`]) applied
//! in a fixed order (density, blur, rotate, flip, quality, trim, crop), not
//! looked up by name. Adding a transform means adding a variant, and the
//! compiler finds every backend that must handle it.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling, and encoding (rav1e for AVIF). No ImageMagick, no system
//! libraries.
//!
//! ## Run Everything, Report the First Error
//!
//! Neither a failing file nor a failing pass cancels its siblings. Work
//! already written stays in the collection; the caller gets the first error
//! in pass order (and within a pass, in key order).

pub mod collection;
pub mod config;
pub mod convert;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pass;
