//! Conversion configuration.
//!
//! A conversion is described by one or more *passes*. Each pass selects files
//! with a glob and converts them to a target format. In a config file passes
//! are written as a TOML array of tables:
//!
//! ```toml
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [[pass]]
//! src = "**/*.png"          # Glob selecting input paths (required)
//! target = "jpg"            # Output format
//! quality = 80
//!
//! [[pass]]
//! src = "photos/*.jpg"
//! target = "webp"
//! name_format = "%b_thumb%e"
//! remove = false
//! [pass.resize]
//! width = 320
//! height = 240
//! style = "fit"             # fit | exact | fill | shrink | enlarge
//! ```
//!
//! Unknown keys are rejected to catch typos early. The required `src` field
//! is checked when a pass *runs*, not when the file is parsed, so a bad pass
//! fails on its own without taking sibling passes down with it.

use crate::imaging::{CropSpec, Quality, ResizeSpec, TransformParam};
use crate::naming;
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("\"{0}\" is required")]
    MissingField(&'static str),
    #[error("Invalid glob pattern {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// One conversion pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PassConfig {
    /// Glob selecting input paths.
    pub src: Option<String>,
    /// Output format identifier (`jpg`, `png`, `webp`, ...).
    pub target: Option<String>,
    /// Output extension including the dot. Defaults to `.` + `target`.
    pub extension: Option<String>,
    /// Output filename template; see [`naming`].
    #[serde(alias = "nameFormat")]
    pub name_format: Option<String>,
    pub resize: Option<ResizeSpec>,
    /// Delete each converted source from the collection.
    pub remove: bool,
    pub density: Option<f64>,
    pub blur: Option<f64>,
    pub rotate: Option<f64>,
    pub flip: Option<bool>,
    pub quality: Option<u8>,
    pub trim: Option<bool>,
    pub crop: Option<CropSpec>,
}

impl PassConfig {
    /// A pass converting `src` matches to `target`.
    pub fn new(src: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            target: Some(target.into()),
            ..Default::default()
        }
    }

    /// The required glob, or [`ConfigError::MissingField`].
    pub fn require_src(&self) -> Result<&str, ConfigError> {
        self.src
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField("src"))
    }

    /// Compile `src` into a matcher. `*` and `?` stay within one path
    /// segment; `**` crosses segments.
    pub fn matcher(&self) -> Result<GlobMatcher, ConfigError> {
        let pattern = self.require_src()?;
        GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map(|glob| glob.compile_matcher())
            .map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })
    }

    /// Output filename template: explicit, or the default for whether this
    /// pass resizes.
    pub fn name_format(&self) -> &str {
        naming::default_name_format(self.name_format.as_deref(), self.resize.is_some())
    }

    /// Output extension: `extension` if set, else `.` + `target`.
    ///
    /// `None` when neither is set; the converter then keeps each source's
    /// own extension.
    pub fn output_extension(&self) -> Option<String> {
        match (&self.extension, &self.target) {
            (Some(ext), _) => Some(ext.clone()),
            (None, Some(target)) => Some(format!(".{target}")),
            (None, None) => None,
        }
    }

    /// Encoder format: `target`, else the extension without its dot.
    pub fn output_format(&self) -> Option<String> {
        self.target.clone().or_else(|| {
            self.extension
                .as_deref()
                .map(|e| e.trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
        })
    }

    /// The transform parameters present on this pass. Quality defaults
    /// to 90.
    pub fn transform_params(&self) -> Vec<TransformParam> {
        let mut params = Vec::new();
        if let Some(dpi) = self.density {
            params.push(TransformParam::Density(dpi));
        }
        if let Some(sigma) = self.blur {
            params.push(TransformParam::Blur(sigma));
        }
        if let Some(degrees) = self.rotate {
            params.push(TransformParam::Rotate(degrees));
        }
        if let Some(flip) = self.flip {
            params.push(TransformParam::Flip(flip));
        }
        params.push(TransformParam::Quality(
            self.quality.map(Quality::new).unwrap_or_default(),
        ));
        if self.trim == Some(true) {
            params.push(TransformParam::Trim);
        }
        if let Some(crop) = self.crop {
            params.push(TransformParam::Crop(crop));
        }
        params
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversion workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Config file contents: processing settings plus the pass list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub processing: ProcessingConfig,
    #[serde(rename = "pass")]
    pub passes: Vec<PassConfig>,
}

impl ConvertConfig {
    /// Check everything that can be checked before running: every pass has a
    /// compilable `src`, and at least one pass exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passes.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[pass]] is required".into(),
            ));
        }
        for pass in &self.passes {
            pass.matcher()?;
        }
        Ok(())
    }
}

/// Parse config text without validating passes.
pub fn parse_config(text: &str) -> Result<ConvertConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Load config from a TOML file without validating passes.
pub fn load_config(path: &Path) -> Result<ConvertConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock config with every key explained.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgconv configuration
# =====================
#
# Each [[pass]] selects files by glob and converts them. Passes run
# concurrently; files produced by one pass are never picked up by another
# pass of the same run.

[processing]
# Max parallel workers. Omit for one per CPU core.
# max_processes = 4

[[pass]]
# Glob selecting input paths, relative to the source directory (required).
# `*` stays inside one directory, `**` crosses directories.
src = "**/*.png"

# Output format: jpg, png, webp, avif, gif, bmp, tiff.
target = "jpg"

# Output extension. Defaults to "." + target.
# extension = ".jpeg"

# Output filename template. Tokens:
#   %b  source basename without extension
#   %e  output extension
#   %x  width  (requested resize width, or the encoded width)
#   %y  height (requested resize height, or the encoded height)
# Defaults to "%b_%x_%y%e" when resizing, "%b%e" otherwise.
# name_format = "%b%e"

# Delete the source file after converting it.
remove = false

# Optional transforms, applied in this order after any resize:
# density = 300.0      # DPI hint
# blur = 1.5           # gaussian sigma
# rotate = 90.0        # degrees, multiples of 90
# flip = true          # mirror top-to-bottom
quality = 90           # 1-100, lossy encoders only
# trim = true          # strip uniform border
# crop = { x = 0, y = 0, width = 100, height = 100 }

# [pass.resize]
# width = 800
# height = 600
# style = "fit"        # fit | exact | fill | shrink | enlarge
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ResizeStyle;
    use tempfile::TempDir;

    #[test]
    fn pass_without_src_is_missing_field() {
        let pass = PassConfig {
            target: Some("jpg".into()),
            ..Default::default()
        };
        assert!(matches!(
            pass.require_src(),
            Err(ConfigError::MissingField("src"))
        ));
        assert!(matches!(
            pass.matcher(),
            Err(ConfigError::MissingField("src"))
        ));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let pass = PassConfig::new("photos/[abc", "jpg");
        assert!(matches!(
            pass.matcher(),
            Err(ConfigError::InvalidGlob { .. })
        ));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let m = PassConfig::new("*.png", "jpg").matcher().unwrap();
        assert!(m.is_match("a.png"));
        assert!(!m.is_match("dir/a.png"));

        let m = PassConfig::new("**/*.png", "jpg").matcher().unwrap();
        assert!(m.is_match("dir/sub/a.png"));
        assert!(m.is_match("a.png"));
    }

    #[test]
    fn extension_defaults_to_dot_target() {
        let pass = PassConfig::new("*.png", "webp");
        assert_eq!(pass.output_extension().as_deref(), Some(".webp"));
        assert_eq!(pass.output_format().as_deref(), Some("webp"));

        let pass = PassConfig {
            extension: Some(".jpeg".into()),
            ..PassConfig::new("*.png", "jpg")
        };
        assert_eq!(pass.output_extension().as_deref(), Some(".jpeg"));
        assert_eq!(pass.output_format().as_deref(), Some("jpg"));
    }

    #[test]
    fn format_falls_back_to_extension() {
        let pass = PassConfig {
            src: Some("*.png".into()),
            extension: Some(".webp".into()),
            ..Default::default()
        };
        assert_eq!(pass.output_format().as_deref(), Some("webp"));
    }

    #[test]
    fn name_format_default_follows_resize() {
        let mut pass = PassConfig::new("*.png", "jpg");
        assert_eq!(pass.name_format(), "%b%e");
        pass.resize = Some(ResizeSpec {
            width: 10,
            height: 10,
            style: ResizeStyle::Fit,
        });
        assert_eq!(pass.name_format(), "%b_%x_%y%e");
        pass.name_format = Some("%b-x%e".into());
        assert_eq!(pass.name_format(), "%b-x%e");
    }

    #[test]
    fn transform_params_default_quality_only() {
        let pass = PassConfig::new("*.png", "jpg");
        assert_eq!(
            pass.transform_params(),
            vec![TransformParam::Quality(Quality::new(90))]
        );
    }

    #[test]
    fn transform_params_collects_present_values() {
        let pass = PassConfig {
            blur: Some(2.0),
            rotate: Some(180.0),
            quality: Some(60),
            trim: Some(false),
            ..PassConfig::new("*.png", "jpg")
        };
        assert_eq!(
            pass.transform_params(),
            vec![
                TransformParam::Blur(2.0),
                TransformParam::Rotate(180.0),
                TransformParam::Quality(Quality::new(60)),
            ]
        );
    }

    #[test]
    fn parse_passes_from_toml() {
        let config = parse_config(
            r#"
[processing]
max_processes = 2

[[pass]]
src = "*.png"
target = "jpg"

[[pass]]
src = "*.jpg"
target = "webp"
nameFormat = "%b_small%e"
remove = true
crop = { x = 1, y = 2, width = 3, height = 4 }
[pass.resize]
width = 100
height = 50
resizeStyle = "exact"
"#,
        )
        .unwrap();

        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.passes.len(), 2);
        let second = &config.passes[1];
        assert_eq!(second.name_format.as_deref(), Some("%b_small%e"));
        assert!(second.remove);
        assert_eq!(second.resize.unwrap().style, ResizeStyle::Exact);
        assert_eq!(second.crop.unwrap().height, 4);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_key_rejected() {
        let result = parse_config("[[pass]]\nsrc = \"*.png\"\ntargte = \"jpg\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn missing_src_parses_but_fails_validation() {
        let config = parse_config("[[pass]]\ntarget = \"jpg\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("src"))
        ));
    }

    #[test]
    fn empty_pass_list_fails_validation() {
        let config = parse_config("").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("convert.toml");
        fs::write(&path, "[[pass]]\nsrc = \"*.gif\"\ntarget = \"png\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.passes[0].src.as_deref(), Some("*.gif"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("convert.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_toml_is_valid() {
        let config = parse_config(stock_config_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.passes[0].target.as_deref(), Some("jpg"));
    }

    #[test]
    fn default_processing_config() {
        assert_eq!(ProcessingConfig::default().max_processes, None);
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
