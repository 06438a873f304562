//! Prometheus-style plaintext rendering of one collection cycle.

use crate::metric::{Metric, MetricName};
use indexmap::IndexMap;
use metrics_exporter_prometheus::formatting::sanitize_label_value;
use std::fmt::Write;

pub const CONTENT_TYPE: &str = "text/plain";
pub const SCRAPE_ERRORS: &str = "evm_scrape_errors";

/// `TYPE`/`UNIT` declarations for every gas metric, emitted once per response.
pub fn type_header() -> String {
    let mut out = String::new();
    for name in MetricName::ALL {
        let _ = writeln!(out, "# TYPE {name} gauge");
        let _ = writeln!(out, "# UNIT {name} {}", name.unit());
    }
    out
}

/// Renders the header, the per-source error counters, then the samples in the
/// order they were collected. Label values are escaped (`\\`, `"`, newline).
pub fn render(metrics: &[Metric], errors: &IndexMap<String, u64>) -> String {
    let mut out = type_header();

    let _ = writeln!(out, "# TYPE {SCRAPE_ERRORS} counter");
    for (source, count) in errors {
        let _ = writeln!(
            out,
            "{SCRAPE_ERRORS}{{source=\"{}\"}} {count}",
            sanitize_label_value(source)
        );
    }

    for metric in metrics {
        let _ = writeln!(
            out,
            "{}{{chain=\"{}\",source=\"{}\"}} {}",
            metric.name,
            sanitize_label_value(&metric.chain),
            sanitize_label_value(&metric.source),
            metric.value
        );
    }

    out
}
