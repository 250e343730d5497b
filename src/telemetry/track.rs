use std::collections::HashMap;

use super::report::TelemetryReport;

/// Last report seen per serial.
#[derive(Debug, Default)]
pub struct TrackStore {
    last: HashMap<String, TelemetryReport>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self, serial: &str) -> Option<&TelemetryReport> {
        self.last.get(serial)
    }

    pub fn record(&mut self, report: TelemetryReport) {
        self.last.insert(report.serial.clone(), report);
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }
}

/// Vertical speed in m/s between two reports of the same balloon.
///
/// Unknown (`None`) unless both reports carry a time, the previous report
/// has a nonzero altitude and time, and time moved forward.
pub fn climb_rate(previous: &TelemetryReport, current: &TelemetryReport) -> Option<f64> {
    let prev_alt = previous.alt.filter(|a| *a != 0.0)?;
    let prev_time = previous.time.filter(|t| *t != 0.0)?;
    let dt = current.time? - prev_time;
    if dt <= 0.0 {
        return None;
    }
    Some((current.alt_or_zero() - prev_alt) / dt)
}
