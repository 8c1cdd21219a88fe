//! crates/protolab_core/src/export.rs
//!
//! Plain-text snapshot of an estimate, suitable for download.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::Catalog;
use crate::estimate::Estimate;
use crate::selection::SelectionStore;

pub const REPORT_MIME: &str = "text/plain";

const RULE: &str = "========================================";
const DISCLAIMER: &str = "Note: This is an approximate estimate. Final pricing may vary \
based on component availability, quantities and project requirements.";

/// Renders the report. Output depends only on the inputs; `date` fills the header line.
pub fn render_report(catalog: &Catalog, store: &SelectionStore, date: NaiveDate) -> String {
    let estimate = Estimate::compute(catalog, store);
    let mut out = String::new();

    out.push_str("PROTOTYPE COST ESTIMATE\n");
    out.push_str(&format!("Generated: {}\n", date.format("%Y-%m-%d")));
    out.push_str(RULE);
    out.push('\n');

    for section in estimate.classes.iter().filter(|c| !c.lines.is_empty()) {
        out.push_str(&format!("\n{}:\n", section.class.banner()));
        for line in &section.lines {
            if section.class.is_single_select() {
                out.push_str(&format!("   {} - ₹{}\n", line.name, line.line_total));
            } else {
                out.push_str(&format!(
                    "   {} x{} - ₹{}\n",
                    line.name, line.quantity, line.line_total
                ));
            }
        }
    }

    out.push_str(&format!(
        "\n{rule}\nTOTAL ESTIMATED COST: ₹{total}\n{rule}\n\n{note}\n",
        rule = RULE,
        total = estimate.total,
        note = DISCLAIMER
    ));
    out
}

/// `estimate-<unix millis>.txt`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("estimate-{}.txt", now.timestamp_millis())
}
