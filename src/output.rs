//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ```text
//! Pass 1: **/*.png
//!     photos/dawn.png → photos/dawn.jpg
//!     photos/dusk.png → photos/dusk.jpg (source removed)
//! Pass 2: *.gif (nothing to convert)
//!
//! Converted 2 files, removed 1 source, wrote 14 files
//! ```

use crate::config::ConvertConfig;
use crate::convert::ConvertReport;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    match (n, word.ends_with('s')) {
        (1, _) => format!("{n} {word}"),
        (_, true) => format!("{n} {word}es"),
        (_, false) => format!("{n} {word}s"),
    }
}

/// Lines describing a finished conversion run.
pub fn format_convert_output(report: &ConvertReport, written: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, pass) in report.passes.iter().enumerate() {
        if pass.converted.is_empty() {
            lines.push(format!("Pass {}: {} (nothing to convert)", i + 1, pass.src));
            continue;
        }
        lines.push(format!("Pass {}: {}", i + 1, pass.src));
        for (source, output) in &pass.converted {
            if pass.removed.contains(source) {
                lines.push(format!("{}{source} → {output} (source removed)", indent(1)));
            } else {
                lines.push(format!("{}{source} → {output}", indent(1)));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Converted {}, removed {}, wrote {}",
        plural(report.converted_count(), "file"),
        plural(report.removed_count(), "source"),
        plural(written, "file"),
    ));
    lines
}

pub fn print_convert_output(report: &ConvertReport, written: usize) {
    for line in format_convert_output(report, written) {
        println!("{line}");
    }
}

/// Lines describing a validated config.
pub fn format_check_output(config: &ConvertConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, pass) in config.passes.iter().enumerate() {
        let src = pass.src.as_deref().unwrap_or("<missing>");
        let target = pass
            .output_extension()
            .unwrap_or_else(|| "(same format)".to_string());
        let mut line = format!("Pass {}: {src} → {target}", i + 1);
        if let Some(resize) = &pass.resize {
            line.push_str(&format!(" resize {}x{}", resize.width, resize.height));
        }
        if pass.remove {
            line.push_str(" (removes sources)");
        }
        lines.push(line);
        lines.push(format!("{}Name: {}", indent(1), pass.name_format()));
    }
    lines.push(format!("{} valid", plural(config.passes.len(), "pass")));
    lines
}

pub fn print_check_output(config: &ConvertConfig) {
    for line in format_check_output(config) {
        println!("{line}");
    }
}
