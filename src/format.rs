//! Human-readable aggregate of a batch, spliced into the request payload.

use crate::executor::BatchOutcome;
use crate::runtime::ExecutionResult;
use std::fmt::Write;

fn secs(duration: std::time::Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

fn write_section(out: &mut String, result: &ExecutionResult) {
    let _ = writeln!(
        out,
        "\n### {} ({}, {})",
        result.agent_id,
        result.status,
        secs(result.duration)
    );
    match (&result.output, &result.error) {
        (Some(output), _) => {
            let _ = writeln!(out, "{}", output.trim_end());
        }
        (None, Some(error)) => {
            let _ = writeln!(out, "Error: {}", error);
        }
        (None, None) => out.push_str("(no output)\n"),
    }
}

/// Render counts, wall time, and one section per result in submission order.
pub fn format_outcome(outcome: &BatchOutcome) -> String {
    let mut out = String::from("## Subagent Results\n\n");
    let _ = writeln!(
        out,
        "Agents run: {} | Succeeded: {} | Failed: {} | Total time: {}",
        outcome.results.len(),
        outcome.succeeded(),
        outcome.failed(),
        secs(outcome.wall_time)
    );
    if !outcome.skipped.is_empty() {
        let _ = writeln!(
            out,
            "Not run (concurrency limit): {}",
            outcome.skipped.join(", ")
        );
    }
    for result in &outcome.results {
        write_section(&mut out, result);
    }
    out
}
