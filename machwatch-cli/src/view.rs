//! Plain-text rendering of engine events.

use std::fmt::Write;

use machwatch_engine::{DerivedSeries, MonitorEvent, MonitoringState, SeriesReading, TickReport};

/// Placeholder for a series with no data this tick.
const UNAVAILABLE: &str = "--";

/// Render an event for stdout, or `None` for events that only go to the log.
pub fn render_event(event: &MonitorEvent) -> Option<String> {
    match event {
        MonitorEvent::Tick(report) => Some(render_tick(report)),
        MonitorEvent::Discovered(series) => Some(render_discovered(series)),
        MonitorEvent::StateChanged(state) => Some(render_state(state)),
        MonitorEvent::Unavailable { .. } | MonitorEvent::FetchFailed { .. } => None,
    }
}

/// One line per tick: `[tick 3 @ 1700000030] CPU 10.0 | RAM -- | ...`.
pub fn render_tick(report: &TickReport) -> String {
    let mut line = format!("[tick {} @ {}] ", report.tick, report.window.stop_secs());
    line.push_str(&render_readings(&report.readings, " | "));
    line
}

pub fn render_readings(readings: &[SeriesReading], separator: &str) -> String {
    readings
        .iter()
        .map(|r| format!("{} {}", r.series.label, format_value(r.latest())))
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_discovered(series: &[DerivedSeries]) -> String {
    let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
    format!("+ new series: {}", labels.join(", "))
}

pub fn render_state(state: &MonitoringState) -> String {
    let mut out = String::from("monitoring ");
    out.push_str(if state.enabled { "enabled" } else { "disabled" });
    if state.pending {
        out.push_str(", request pending");
    }
    out.push_str(if state.running { ", running" } else { ", idle" });
    out
}

/// Multi-line status block for the `status` command.
pub fn render_status(state: &MonitoringState, visible: bool, readings: &[SeriesReading]) -> String {
    let mut out = render_state(state);
    if !visible {
        out.push_str(", view paused");
    }
    for reading in readings {
        let _ = write!(
            out,
            "\n  {:<24} {}",
            reading.series.label,
            match &reading.values {
                Ok(values) => format!("{} samples, latest {}", values.len(), format_value(reading.latest())),
                Err(reason) => format!("{UNAVAILABLE} ({reason})"),
            }
        );
    }
    out
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 100.0 => format!("{v:.0}"),
        Some(v) if v.abs() >= 1.0 => format!("{v:.1}"),
        Some(v) => format!("{v:.2}"),
        None => UNAVAILABLE.to_string(),
    }
}
