//! Conversion entry point: run one or many passes over a file collection.
//!
//! ```text
//! convert(options, files)
//!   ├── pass 1 ──┐
//!   ├── pass 2 ──┼── run concurrently, share `files` and one `ResultSet`
//!   └── pass N ──┘
//!        └── per key, in parallel: match → convert → insert
//! ```
//!
//! Passes are never cancelled: all of them run to completion, then the first
//! error (in pass order) is returned. Mutations made before a failure stay in
//! the collection.
//!
//! ## Invocation-scoped isolation
//!
//! The [`ResultSet`] that stops passes from converting each other's outputs
//! is created fresh for every call. Running `convert` twice on the same
//! collection therefore lets the second call pick up the first call's outputs
//! when its globs match them.

use crate::collection::{FileCollection, ResultSet};
use crate::config::{ConfigError, PassConfig};
use crate::imaging::{AdapterError, ImageBackend, RustBackend};
use crate::pass::{PassReport, run_pass};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid pass configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Encountered error while converting image {path}: {source}")]
    ImageConversion {
        path: String,
        #[source]
        source: AdapterError,
    },
}

/// One pass or an ordered list of passes.
///
/// A single pass behaves exactly like a one-element list.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertOptions {
    Single(PassConfig),
    Many(Vec<PassConfig>),
}

impl ConvertOptions {
    pub fn passes(&self) -> &[PassConfig] {
        match self {
            ConvertOptions::Single(pass) => std::slice::from_ref(pass),
            ConvertOptions::Many(passes) => passes,
        }
    }
}

impl From<PassConfig> for ConvertOptions {
    fn from(pass: PassConfig) -> Self {
        ConvertOptions::Single(pass)
    }
}

impl From<Vec<PassConfig>> for ConvertOptions {
    fn from(passes: Vec<PassConfig>) -> Self {
        ConvertOptions::Many(passes)
    }
}

/// Outputs of every pass in a successful run, in pass order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub passes: Vec<PassReport>,
}

impl ConvertReport {
    pub fn converted_count(&self) -> usize {
        self.passes.iter().map(|p| p.converted.len()).sum()
    }

    pub fn removed_count(&self) -> usize {
        self.passes.iter().map(|p| p.removed.len()).sum()
    }
}

/// Convert `files` in place using the pure Rust backend.
pub fn convert(
    options: impl Into<ConvertOptions>,
    files: &FileCollection,
) -> Result<(), ConvertError> {
    convert_with_backend(&RustBackend::new(), options, files)
}

/// Convert `files` in place using a specific backend (allows testing with mock).
pub fn convert_with_backend<B: ImageBackend>(
    backend: &B,
    options: impl Into<ConvertOptions>,
    files: &FileCollection,
) -> Result<(), ConvertError> {
    convert_with_report(backend, options, files).map(|_| ())
}

/// Like [`convert_with_backend`], returning what each pass produced.
pub fn convert_with_report<B: ImageBackend>(
    backend: &B,
    options: impl Into<ConvertOptions>,
    files: &FileCollection,
) -> Result<ConvertReport, ConvertError> {
    let options = options.into();
    let results = ResultSet::new();

    let outcomes: Vec<Result<PassReport, ConvertError>> = options
        .passes()
        .par_iter()
        .map(|pass| run_pass(backend, pass, files, &results))
        .collect();

    log::debug!("Run produced {} files", results.len());

    let mut passes = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        passes.push(outcome?);
    }
    Ok(ConvertReport { passes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::FileRecord;
    use crate::imaging::backend::tests::{MockBackend, mock_image};
    use crate::imaging::{Dimensions, ResizeSpec, ResizeStyle};

    fn collection(entries: &[(&str, Vec<u8>)]) -> FileCollection {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), FileRecord::new(v.clone())))
            .collect()
    }

    #[test]
    fn single_config_matches_one_element_list() {
        let config = PassConfig {
            resize: Some(ResizeSpec {
                width: 50,
                height: 50,
                style: ResizeStyle::Fit,
            }),
            ..PassConfig::new("*.png", "jpg")
        };

        let single = collection(&[("a.png", mock_image(100, 80))]);
        convert_with_backend(&MockBackend::new(), config.clone(), &single).unwrap();

        let list = collection(&[("a.png", mock_image(100, 80))]);
        convert_with_backend(&MockBackend::new(), vec![config], &list).unwrap();

        assert_eq!(single.into_sorted(), list.into_sorted());
    }

    #[test]
    fn later_pass_skips_earlier_outputs_regardless_of_order() {
        let png_to_jpg = PassConfig::new("*.png", "jpg");
        let jpg_to_webp = PassConfig::new("*.jpg", "webp");

        for round in 0..50 {
            let passes = if round % 2 == 0 {
                vec![png_to_jpg.clone(), jpg_to_webp.clone()]
            } else {
                vec![jpg_to_webp.clone(), png_to_jpg.clone()]
            };
            let backend = MockBackend::new();
            let files = collection(&[("a.png", mock_image(10, 10))]);

            convert_with_backend(&backend, passes, &files).unwrap();

            assert_eq!(files.keys(), vec!["a.jpg", "a.png"], "round {round}");
            assert_eq!(backend.decoded(), vec!["10x10"], "round {round}");
        }
    }

    #[test]
    fn second_invocation_can_reprocess_first_outputs() {
        let files = collection(&[("a.png", mock_image(10, 10))]);
        let backend = MockBackend::new();

        convert_with_backend(&backend, PassConfig::new("*.png", "jpg"), &files).unwrap();
        convert_with_backend(&backend, PassConfig::new("*.jpg", "webp"), &files).unwrap();

        assert_eq!(files.keys(), vec!["a.jpg", "a.png", "a.webp"]);
    }

    #[test]
    fn missing_src_fails_without_blocking_siblings() {
        let files = collection(&[("a.png", mock_image(10, 10))]);
        let broken = PassConfig {
            target: Some("jpg".into()),
            ..Default::default()
        };
        let good = PassConfig::new("*.png", "webp");

        let result = convert_with_backend(&MockBackend::new(), vec![broken, good], &files);

        assert!(matches!(
            result,
            Err(ConvertError::Config(ConfigError::MissingField("src")))
        ));
        assert!(files.contains("a.webp"));
    }

    #[test]
    fn first_error_in_pass_order_wins() {
        let files = collection(&[("a.png", mock_image(10, 10))]);
        let bad_format = PassConfig::new("*.png", "bogus");
        let no_src = PassConfig::default();

        let result = convert_with_backend(&MockBackend::new(), vec![bad_format, no_src], &files);
        assert!(matches!(result, Err(ConvertError::ImageConversion { .. })));
    }

    #[test]
    fn remove_and_size_metadata() {
        let files = collection(&[
            ("keep/a.png", mock_image(30, 20)),
            ("drop/b.png", mock_image(60, 40)),
        ]);
        let keep = PassConfig::new("keep/*.png", "jpg");
        let drop = PassConfig {
            remove: true,
            ..PassConfig::new("drop/*.png", "jpg")
        };

        convert_with_backend(&MockBackend::new(), vec![keep, drop], &files).unwrap();

        let kept = files.get("keep/a.png").unwrap();
        assert_eq!(kept.image_size, Some(Dimensions::new(30, 20)));
        assert!(!files.contains("drop/b.png"));
        assert_eq!(
            files.get("drop/b.jpg").unwrap().image_size,
            Some(Dimensions::new(60, 40))
        );
    }

    #[test]
    fn default_templates_with_and_without_resize() {
        let files = collection(&[("a.png", mock_image(100, 100))]);
        let resized = PassConfig {
            resize: Some(ResizeSpec {
                width: 64,
                height: 32,
                style: ResizeStyle::Exact,
            }),
            ..PassConfig::new("*.png", "jpg")
        };
        let plain = PassConfig::new("*.png", "webp");

        convert_with_backend(&MockBackend::new(), vec![resized, plain], &files).unwrap();

        assert!(files.contains("a_64_32.jpg"));
        assert!(files.contains("a.webp"));
    }

    #[test]
    fn report_lists_outputs_per_pass() {
        let files = collection(&[("a.png", mock_image(10, 10)), ("b.png", mock_image(5, 5))]);
        let report = convert_with_report(
            &MockBackend::new(),
            PassConfig {
                remove: true,
                ..PassConfig::new("*.png", "jpg")
            },
            &files,
        )
        .unwrap();

        assert_eq!(report.passes.len(), 1);
        assert_eq!(report.converted_count(), 2);
        assert_eq!(report.removed_count(), 2);
        assert_eq!(
            report.passes[0].converted,
            vec![
                ("a.png".to_string(), "a.jpg".to_string()),
                ("b.png".to_string(), "b.jpg".to_string())
            ]
        );
    }

    #[test]
    fn empty_pass_list_is_ok() {
        let files = collection(&[("a.png", mock_image(10, 10))]);
        convert_with_backend(&MockBackend::new(), Vec::<PassConfig>::new(), &files).unwrap();
        assert_eq!(files.len(), 1);
    }
}
