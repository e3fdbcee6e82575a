//! Output formatting and display for waybill.
//!
//! # Examples
//!
//! ```no_run
//! use waybill::output::{OutputFormatter, display_report};
//! use waybill::config::Config;
//!
//! # async fn example(config: Config) -> Result<(), Box<dyn std::error::Error>> {
//! let report = waybill::scenario::run_one_sided(&config).await?;
//! display_report(&OutputFormatter::from_config(&config), &report);
//! # Ok(())
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::report::{ItemOutcome, RunReport};
use crate::utils::file_name_of;

/// Display every outcome of a run followed by a one-line summary.
pub fn display_report(formatter: &OutputFormatter, report: &RunReport) {
    formatter.section(&format!("Scenario: {}", report.scenario));

    for outcome in &report.outcomes {
        display_outcome(formatter, outcome);
    }

    if !report.remaining.is_empty() {
        let names: Vec<String> = report.remaining.iter().map(|p| file_name_of(p)).collect();
        formatter.warning(&format!("Not bundled: {}", names.join(", ")));
    }

    formatter.blank_line();
    formatter.info(&summary_line(report));
}

fn display_outcome(formatter: &OutputFormatter, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Written {
            inputs,
            output,
            pages,
            stamp,
            faults,
            dry_run,
        } => {
            let verb = if *dry_run { "Would write" } else { "Wrote" };
            formatter.success(&format!(
                "{verb} {} ({pages} pages)",
                output.display()
            ));
            for input in inputs {
                formatter.detail("from", &input.display().to_string());
            }
            if let Some(stamp) = stamp {
                formatter.detail("stamp", &file_name_of(stamp));
            }
            for fault in faults {
                formatter.warning(&format!(
                    "{}: page {} {:?} layer: {}",
                    file_name_of(output),
                    fault.page,
                    fault.layer,
                    fault.reason
                ));
            }
        }
        ItemOutcome::Failed { inputs, error } => {
            let names: Vec<String> = inputs.iter().map(|p| file_name_of(p)).collect();
            formatter.error(&format!("{}: {}", names.join(", "), error.message));
        }
        ItemOutcome::Skipped { inputs, reason } => {
            let names: Vec<String> = inputs.iter().map(|p| file_name_of(p)).collect();
            formatter.warning(&format!("Skipped {}: {reason}", names.join(", ")));
        }
    }
}

/// One-line summary of a run.
pub fn summary_line(report: &RunReport) -> String {
    format!(
        "{} written, {} failed, {} skipped in {:.2}s",
        report.written(),
        report.failed(),
        report.skipped(),
        report.elapsed.as_secs_f64()
    )
}
