//! CLI output formatting for every command.
//!
//! Output leads with what was made, not where it went: each entity shows its
//! positional index and identity first, with paths and ids as indented
//! context lines.
//!
//! # Output Format
//!
//! ## Compose
//!
//! ```text
//! Composed 1024x768 JPEG (182344 bytes)
//!     Output: drake.jpg
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 drake 1024x1024 (201877 bytes)
//!     Output: out/drake-3f9a0c1d22be.jpg
//! 002 cat FAILED
//!     Error: fetch failed: http://example.com/cat.jpg answered HTTP 404
//!
//! Composed 1 of 2 jobs, 1 failed
//! ```
//!
//! ## Templates
//!
//! ```text
//! 001 Drake Hotline Bling (1200x1200)
//!     Id: 181913649
//!     Url: https://i.imgflip.com/30b1gx.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::batch::BatchReport;
use crate::imaging::CompositionResult;
use crate::templates::MemeTemplate;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Compose
// ============================================================================

pub fn format_compose_result(result: &CompositionResult, output: &Path) -> Vec<String> {
    vec![
        format!(
            "Composed {}x{} JPEG ({} bytes)",
            result.width,
            result.height,
            result.bytes.len()
        ),
        format!("{}Output: {}", indent(1), output.display()),
    ]
}

pub fn print_compose_result(result: &CompositionResult, output: &Path) {
    for line in format_compose_result(result, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Per-job lines in job order, then a one-line summary.
pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();

    for outcome in &report.outcomes {
        let header = format!("{} {}", format_index(outcome.position), outcome.label);
        match &outcome.result {
            Ok(out) => {
                lines.push(format!(
                    "{} {}x{} ({} bytes)",
                    header, out.width, out.height, out.bytes
                ));
                lines.push(format!("{}Output: {}", indent(1), out.path.display()));
            }
            Err(e) => {
                lines.push(format!("{} FAILED", header));
                lines.push(format!("{}Error: {}", indent(1), e));
            }
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let total = report.outcomes.len();
    let failed = report.failed();
    if failed == 0 {
        lines.push(format!("Composed {} of {} jobs", report.succeeded(), total));
    } else {
        lines.push(format!(
            "Composed {} of {} jobs, {} failed",
            report.succeeded(),
            total,
            failed
        ));
    }
    lines
}

pub fn print_batch_report(report: &BatchReport) {
    for line in format_batch_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Templates
// ============================================================================

pub fn format_templates(templates: &[MemeTemplate]) -> Vec<String> {
    if templates.is_empty() {
        return vec!["No templates".to_string()];
    }

    let mut lines = Vec::new();
    for (i, t) in templates.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}x{})",
            format_index(i + 1),
            t.name,
            t.width,
            t.height
        ));
        lines.push(format!("{}Id: {}", indent(1), t.id));
        lines.push(format!("{}Url: {}", indent(1), t.url));
    }
    lines
}

pub fn print_templates(templates: &[MemeTemplate]) {
    for line in format_templates(templates) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{JobError, JobOutcome, JobOutput};
    use std::path::PathBuf;

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn compose_result_shows_size_and_path() {
        let result = CompositionResult {
            bytes: vec![0; 1234],
            width: 1024,
            height: 768,
        };
        assert_eq!(
            format_compose_result(&result, Path::new("out.jpg")),
            vec!["Composed 1024x768 JPEG (1234 bytes)", "    Output: out.jpg"]
        );
    }

    #[test]
    fn batch_report_lists_each_job_then_summary() {
        let report = BatchReport {
            outcomes: vec![
                JobOutcome {
                    position: 1,
                    label: "drake".into(),
                    result: Ok(JobOutput {
                        path: PathBuf::from("out/drake-abc.jpg"),
                        width: 1024,
                        height: 1024,
                        bytes: 99,
                    }),
                },
                JobOutcome {
                    position: 2,
                    label: "002".into(),
                    result: Err(JobError::Source),
                },
            ],
        };

        let lines = format_batch_report(&report);
        assert_eq!(lines[0], "001 drake 1024x1024 (99 bytes)");
        assert_eq!(lines[1], "    Output: out/drake-abc.jpg");
        assert_eq!(lines[2], "002 002 FAILED");
        assert!(lines[3].starts_with("    Error: job must name exactly one"));
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "Composed 1 of 2 jobs, 1 failed");
    }

    #[test]
    fn empty_batch_is_just_summary() {
        assert_eq!(
            format_batch_report(&BatchReport::default()),
            vec!["Composed 0 of 0 jobs"]
        );
    }

    #[test]
    fn templates_show_name_id_and_url() {
        let lines = format_templates(&[MemeTemplate {
            id: "181913649".into(),
            name: "Drake Hotline Bling".into(),
            url: "https://i.imgflip.com/30b1gx.jpg".into(),
            width: 1200,
            height: 1200,
        }]);
        assert_eq!(
            lines,
            vec![
                "001 Drake Hotline Bling (1200x1200)",
                "    Id: 181913649",
                "    Url: https://i.imgflip.com/30b1gx.jpg",
            ]
        );
    }

    #[test]
    fn no_templates() {
        assert_eq!(format_templates(&[]), vec!["No templates"]);
    }
}
