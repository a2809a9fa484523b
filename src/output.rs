//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Generating 5 images with 2 workers
//!     001 → 0.png (41ms, worker 0)
//!     002 → 1.png (39ms, worker 1)
//!     003 FAILED: cannot load layer 'eyes' (wink.png): IO error: ...
//!     004 → 3.png (40ms, worker 0)
//!     005 → 4.png (38ms, worker 1)
//!
//! Generated 4 of 5 images in 0.18s (2 workers)
//! Failures
//!     003 cannot load layer 'eyes' (wink.png): IO error: ...
//! ```
//!
//! ## Check
//!
//! ```text
//! Layers
//! 001 background (2 traits)
//!     blue.png
//!     red.png
//! 002 eyes (1 trait)
//!     open.png
//!
//! Jobs: 5 descriptors
//! Missing traits
//!     003 eyes: wink.png
//!     004 eyes: (none selected)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::generate::{GenerateEvent, GenerateSummary};
use crate::scan::{MissingTrait, TraitCatalog};
use std::time::Duration;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based position or id as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Milliseconds below one second, seconds with two decimals above.
fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::Started { total, workers } => vec![format!(
            "Generating {} with {}",
            plural(*total, "image", "images"),
            plural(*workers, "worker", "workers")
        )],
        GenerateEvent::ImageGenerated {
            id,
            name,
            worker,
            duration,
        } => vec![format!(
            "{}{} → {} ({}, worker {})",
            indent(1),
            format_index(*id as usize),
            name,
            format_duration(*duration),
            worker
        )],
        GenerateEvent::ImageFailed { id, error } => vec![format!(
            "{}{} FAILED: {}",
            indent(1),
            format_index(*id as usize),
            error
        )],
    }
}

/// Format the end-of-run summary, listing every failure.
pub fn format_summary(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Generated {} of {} in {} ({})",
            summary.generated.len(),
            plural(summary.total, "image", "images"),
            format_duration(summary.elapsed),
            plural(summary.workers, "worker", "workers")
        ),
    ];
    if !summary.failures.is_empty() {
        lines.push("Failures".to_string());
        for failure in &summary.failures {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(failure.id as usize),
                failure.error
            ));
        }
    }
    lines
}

pub fn print_summary(summary: &GenerateSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the pre-flight view: available traits per layer, then any job-list
/// references with no file behind them.
pub fn format_check_output(
    catalog: &TraitCatalog,
    descriptor_count: usize,
    missing: &[MissingTrait],
) -> Vec<String> {
    let mut lines = vec!["Layers".to_string()];
    for (pos, (layer, values)) in catalog.layers().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(pos + 1),
            layer,
            plural(values.len(), "trait", "traits")
        ));
        for value in values {
            lines.push(format!("{}{}", indent(1), value));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Jobs: {}",
        plural(descriptor_count, "descriptor", "descriptors")
    ));

    if !missing.is_empty() {
        lines.push("Missing traits".to_string());
        for entry in missing {
            lines.push(format!(
                "{}{} {}: {}",
                indent(1),
                format_index(entry.id as usize),
                entry.layer,
                entry.value.as_deref().unwrap_or("(none selected)")
            ));
        }
    }
    lines
}

pub fn print_check_output(catalog: &TraitCatalog, descriptor_count: usize, missing: &[MissingTrait]) {
    for line in format_check_output(catalog, descriptor_count, missing) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
