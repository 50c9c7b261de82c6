use crate::core::RunStats;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

pub fn write_if_configured(stats: &RunStats) -> Result<()> {
    let path = match std::env::var("FIRSTFILL_METRICS_PATH") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return Ok(()),
    };
    write_metrics(&path, stats)
}

pub fn write_metrics(path: &str, stats: &RunStats) -> Result<()> {
    let content = render(stats);
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|err| Error::new(format!("metrics dir create failed: {err}")))?;
        }
    }
    fs::write(path, content).map_err(|err| Error::new(format!("metrics write failed: {err}")))
}

/// Prometheus text exposition of one run.
pub fn render(stats: &RunStats) -> String {
    let mut output = String::new();
    let counters = [
        (
            "firstfill_candle_polls_total",
            "Latest-candle requests sent while waiting for the open",
            stats.candle_polls,
        ),
        (
            "firstfill_candle_errors_total",
            "Latest-candle requests that failed",
            stats.candle_errors,
        ),
        (
            "firstfill_order_submissions_total",
            "Place-order requests sent",
            stats.submissions,
        ),
        (
            "firstfill_protection_waits_total",
            "Open price protection waits",
            stats.protection_waits,
        ),
        (
            "firstfill_price_lowered_total",
            "Resubmissions after price-above-limit",
            stats.price_lowered,
        ),
        (
            "firstfill_price_raised_total",
            "Resubmissions after price-below-limit",
            stats.price_raised,
        ),
        (
            "firstfill_generic_rejections_total",
            "Rejections resubmitted unchanged",
            stats.generic_rejections,
        ),
        (
            "firstfill_transport_failures_total",
            "Order submissions that failed in transport",
            stats.transport_failures,
        ),
    ];
    for (name, help, value) in counters {
        push_line(&mut output, &format!("# HELP {name} {help}"));
        push_line(&mut output, &format!("# TYPE {name} counter"));
        push_line(&mut output, &format!("{name} {value}"));
    }
    push_line(&mut output, "# HELP firstfill_order_placed Whether the run placed its order");
    push_line(&mut output, "# TYPE firstfill_order_placed gauge");
    push_line(
        &mut output,
        &format!("firstfill_order_placed {}", u8::from(stats.placed)),
    );
    output
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}
