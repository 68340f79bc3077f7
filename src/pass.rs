//! A single conversion pass and its per-file unit of work.
//!
//! [`run_pass`] resolves a [`PassConfig`] into a [`PassPlan`] (compiled glob,
//! filename template, output extension and format), snapshots the keys of the
//! collection, and converts every key in parallel with rayon. Keys added while
//! the pass runs, including its own outputs, are not part of the snapshot.
//!
//! ## Per-file steps
//!
//! ```text
//! key ── glob match? ── in result set? ── still present?
//!          │ no            │ yes              │ no
//!          └──────────────►└────────────────►└──► skip
//!
//! decode → resize → density, blur, rotate, flip, quality, trim, crop → encode
//!   → probe output → name from template → probe source → mark + insert output
//!   → remove source (if configured)
//! ```
//!
//! Every file runs to completion even when siblings fail. The pass reports
//! the first failure in snapshot order.

use crate::collection::{FileCollection, FileRecord, ResultSet};
use crate::config::{ConfigError, PassConfig};
use crate::convert::ConvertError;
use crate::imaging::{self, AdapterError, ImageBackend, TransformPlan};
use crate::naming::{self, TemplateContext, Token};
use globset::GlobMatcher;
use rayon::prelude::*;
use std::path::Path;

/// What happened to one key during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Converted; `output` was written into the collection.
    Converted {
        source: String,
        output: String,
        removed_source: bool,
    },
    /// Not selected by the glob.
    NotMatched,
    /// Already produced earlier in this invocation.
    AlreadyProduced(String),
    /// Selected, but the key was removed by a sibling pass before it was read.
    Vanished(String),
}

/// Summary of a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub src: String,
    pub converted: Vec<(String, String)>,
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
}

impl PassReport {
    fn from_outcomes(src: &str, outcomes: Vec<FileOutcome>) -> Self {
        let mut report = PassReport {
            src: src.to_string(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                FileOutcome::Converted {
                    source,
                    output,
                    removed_source,
                } => {
                    if removed_source {
                        report.removed.push(source.clone());
                    }
                    report.converted.push((source, output));
                }
                FileOutcome::AlreadyProduced(key) | FileOutcome::Vanished(key) => {
                    report.skipped.push(key)
                }
                FileOutcome::NotMatched => {}
            }
        }
        report
    }
}

/// A pass configuration resolved for execution. Immutable for the pass.
#[derive(Debug)]
pub struct PassPlan<'a> {
    config: &'a PassConfig,
    matcher: GlobMatcher,
    name_format: &'a str,
    extension: Option<String>,
    format: Option<String>,
}

impl<'a> PassPlan<'a> {
    /// Validate and resolve `config`. Fails with [`ConfigError`] when `src`
    /// is missing or does not compile.
    pub fn new(config: &'a PassConfig) -> Result<Self, ConfigError> {
        let matcher = config.matcher()?;
        Ok(Self {
            config,
            matcher,
            name_format: config.name_format(),
            extension: config.output_extension(),
            format: config.output_format(),
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.matcher.is_match(key)
    }

    /// Convert one key. See the [module docs](self) for the steps.
    pub fn convert_file<B: ImageBackend>(
        &self,
        backend: &B,
        key: &str,
        files: &FileCollection,
        results: &ResultSet,
    ) -> Result<FileOutcome, AdapterError> {
        if !self.matches(key) {
            return Ok(FileOutcome::NotMatched);
        }
        if results.contains(key) {
            log::debug!("Skipping {key}: produced earlier in this run");
            return Ok(FileOutcome::AlreadyProduced(key.to_string()));
        }
        let Some(source) = files.contents(key) else {
            log::debug!("Skipping {key}: no longer in the collection");
            return Ok(FileOutcome::Vanished(key.to_string()));
        };

        let path = Path::new(key);
        let current_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let basename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let extension = self.extension.clone().unwrap_or_else(|| current_ext.clone());
        let format = self
            .format
            .clone()
            .unwrap_or_else(|| current_ext.trim_start_matches('.').to_string());

        let plan = TransformPlan::new(format, self.config.resize, self.config.transform_params());
        let encoded = imaging::run_plan(backend, &source, &plan)?;
        let output_size = backend.probe_dimensions(&encoded)?;

        let mut context = TemplateContext::new();
        context.set(Token::Extension, &extension);
        context.set(Token::Basename, basename);
        match &self.config.resize {
            Some(resize) => {
                context.set(Token::Width, resize.width);
                context.set(Token::Height, resize.height);
            }
            None => {
                context.set(Token::Width, output_size.width);
                context.set(Token::Height, output_size.height);
            }
        }
        let new_name = naming::assemble_filename(self.name_format, &context);
        log::debug!("New name is {new_name}");
        let output = join_key(key, &new_name);

        let source_size = backend.probe_dimensions(&source)?;
        files.set_image_size(key, source_size);

        // Mark before inserting: any pass that can see the new key can also
        // see that it was produced here.
        results.mark(output.clone());
        files.insert(
            output.clone(),
            FileRecord {
                contents: encoded,
                image_size: Some(output_size),
                ..Default::default()
            },
        );

        let removed_source = self.config.remove && output != key;
        if removed_source {
            files.remove(key);
        }

        Ok(FileOutcome::Converted {
            source: key.to_string(),
            output,
            removed_source,
        })
    }
}

/// Join `name` onto the directory of `key`, keeping `/` separators.
fn join_key(key: &str, name: &str) -> String {
    match key.rfind('/') {
        Some(pos) => format!("{}/{}", &key[..pos], name),
        None => name.to_string(),
    }
}

/// Run one pass over every key currently in `files`.
///
/// All per-file tasks run to completion; the first failure (in key order)
/// becomes [`ConvertError::ImageConversion`].
pub fn run_pass<B: ImageBackend>(
    backend: &B,
    config: &PassConfig,
    files: &FileCollection,
    results: &ResultSet,
) -> Result<PassReport, ConvertError> {
    let plan = PassPlan::new(config)?;
    let src = config.require_src()?;
    let keys = files.keys();
    log::info!("Pass {src}: scanning {} files", keys.len());

    let outcomes: Vec<(String, Result<FileOutcome, AdapterError>)> = keys
        .into_par_iter()
        .map(|key| {
            let outcome = plan.convert_file(backend, &key, files, results);
            (key, outcome)
        })
        .collect();

    let mut converted = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for (key, outcome) in outcomes {
        match outcome {
            Ok(outcome) => converted.push(outcome),
            Err(e) => {
                log::warn!("Failed to convert {key}: {e}");
                if first_error.is_none() {
                    first_error = Some(ConvertError::ImageConversion {
                        path: key,
                        source: e,
                    });
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let report = PassReport::from_outcomes(src, converted);
    log::info!(
        "Pass {src}: converted {}, skipped {}",
        report.converted.len(),
        report.skipped.len()
    );
    Ok(report)
}
