//! Plain-text output for `--list` and `--once`.

use cgh_common::config::{PlantStatusRules, Thresholds};
use cgh_common::panels::build_panels;
use cgh_common::registry::Registry;
use cgh_common::state::PollState;
use cgh_common::status::PlantStatus;
use std::fmt::Write;

/// One line per selectable controller: `plant/server/controller  label`.
pub fn options_table(registry: &Registry) -> String {
    let mut out = String::new();
    for option in registry.options() {
        let ids = format!(
            "{}/{}/{}",
            option.plant_id, option.server_id, option.controller_id
        );
        let _ = writeln!(out, "{ids:<32} {}", option.label);
    }
    out
}

/// Panels of a settled poll state, or its error.
pub fn panels_report(
    title: &str,
    state: &PollState,
    thresholds: &Thresholds,
    rules: &PlantStatusRules,
) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "{title}: {error}");
        return out;
    }

    let status = PlantStatus::derive(&state.snapshot, rules);
    let _ = writeln!(out, "{title}  [{status}]");

    for panel in build_panels(&state.snapshot, thresholds) {
        let _ = writeln!(out, "\n{}", panel.title);
        if panel.entries.is_empty() {
            let _ = writeln!(out, "  (sem leituras)");
        }
        for entry in panel.entries {
            let _ = writeln!(
                out,
                "  {:<32} {:>10}  {}",
                entry.name, entry.display, entry.status
            );
        }
    }
    out
}
