//! Prometheus text exposition format.
//!
//! Renders the outcome counters for scraping by a Prometheus server or
//! compatible agent.

use crate::counters::OutcomeCounters;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render the outcome counters into Prometheus text format.
///
/// Every `action` series is present, including those still at zero.
pub fn render_prometheus(counters: &OutcomeCounters) -> String {
    let mut out = String::new();

    out.push_str("# HELP updater_deployment_total Deployment trigger requests by outcome.\n");
    out.push_str("# TYPE updater_deployment_total counter\n");
    for (outcome, value) in counters.snapshot() {
        out.push_str(&format!(
            "updater_deployment_total{{action=\"{}\"}} {}\n",
            outcome.label(),
            value
        ));
    }

    out
}
