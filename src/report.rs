//! Human-readable rendering of lifecycle results.

use exrtiler_core::{ConversionReport, ConversionResult, ConversionStatus, StateEntry, SwitchReport};
use std::fmt::Write;

pub fn render_states(entries: &[StateEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<26} {:<20} {}",
            entry.state.to_string(),
            entry.id.as_str(),
            entry.active_path.display()
        );
    }
    let _ = write!(out, "{} assets", entries.len());
    out
}

pub fn render_result(result: &ConversionResult) -> String {
    let mut line = format!(
        "{:<9} {} -> {}",
        result.status.label(),
        result.source_file.display(),
        result.derived_file.display()
    );
    match &result.status {
        ConversionStatus::Success => {}
        ConversionStatus::Skipped { reason } => {
            let _ = write!(line, " ({reason})");
        }
        ConversionStatus::Failed { error } => {
            let _ = write!(line, ": {error}");
        }
    }
    line
}

pub fn render_results(results: &[ConversionResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(out, "{}", render_result(result));
    }
    let (mut converted, mut skipped, mut failed) = (0, 0, 0);
    for result in results {
        match result.status {
            ConversionStatus::Success => converted += 1,
            ConversionStatus::Skipped { .. } => skipped += 1,
            ConversionStatus::Failed { .. } => failed += 1,
        }
    }
    let _ = write!(out, "Converted {converted}, skipped {skipped}, failed {failed}");
    out
}

pub fn render_conversion(report: &ConversionReport) -> String {
    let mut out = String::new();
    for entry in &report.entries {
        let _ = writeln!(out, "[{}] {}", entry.asset, render_result(&entry.result));
    }
    let _ = write!(
        out,
        "Converted {}, skipped {}, failed {} (batch {})",
        report.succeeded(),
        report.skipped(),
        report.failed(),
        report.batch_id
    );
    out
}

pub fn render_switch(report: &SwitchReport) -> String {
    let mut out = String::new();
    for transition in &report.transitions {
        let _ = write!(
            out,
            "[{}] {} -> {}",
            transition.id,
            transition.to,
            transition.active_path.display()
        );
        if let Some(ref color_space) = transition.restore_color_space {
            let _ = write!(out, " (color space {color_space})");
        }
        out.push('\n');
    }
    for rejection in &report.rejected {
        let _ = writeln!(out, "[{}] unchanged: {}", rejection.asset, rejection.reason);
    }
    let _ = write!(
        out,
        "Switched {}, unchanged {}",
        report.transitions.len(),
        report.rejected.len()
    );
    out
}
