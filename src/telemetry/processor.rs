use log::{debug, error, info, log, log_enabled, Level};
use serde_json::Value;

use super::error::ReportError;
use super::report::TelemetryReport;
use super::track::{climb_rate, TrackStore};
use crate::alert::{AlertLedger, Criterion};
use crate::geo::{self, Observer};
use crate::notify::{Notification, Notifier};

/// A report that satisfied a criterion for the first time.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMatch {
    pub criterion: String,
    pub serial: String,
    pub distance_miles: f64,
    pub altitude_feet: f64,
    pub climb_rate: Option<f64>,
    pub subtype: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Missing `serial`, `lat` or `lon`; dropped silently.
    Discarded,
    /// Present but unusable; dropped with a warning.
    Rejected(String),
    Processed { alerts: usize },
}

/// Owns all per-balloon state. `process` must be called from one place at a
/// time; the session feeds it from a single task.
pub struct Processor<N> {
    observer: Observer,
    criteria: Vec<Criterion>,
    tracks: TrackStore,
    ledger: AlertLedger,
    notifier: N,
}

impl<N: Notifier> Processor<N> {
    pub fn new(observer: Observer, criteria: Vec<Criterion>, notifier: N) -> Self {
        Self {
            observer,
            criteria,
            tracks: TrackStore::new(),
            ledger: AlertLedger::new(),
            notifier,
        }
    }

    pub fn tracked(&self) -> usize {
        self.tracks.len()
    }

    pub fn alerts_sent(&self) -> usize {
        self.ledger.len()
    }

    /// Decodes a raw stream payload. Arrays are treated as batches.
    pub fn process_raw(&mut self, payload: &[u8]) -> Vec<Outcome> {
        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Array(items)) => items.iter().map(|item| self.process(item)).collect(),
            Ok(value) => vec![self.process(&value)],
            Err(e) => vec![self.reject(ReportError::from(e))],
        }
    }

    pub fn process(&mut self, payload: &Value) -> Outcome {
        match self.try_process(payload) {
            Ok(alerts) => Outcome::Processed { alerts },
            Err(e) if e.is_incomplete() => {
                log!(e.level(), "Ignoring sonde message: {}", e);
                Outcome::Discarded
            }
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, e: ReportError) -> Outcome {
        log!(e.level(), "Error processing sonde message: {}", e);
        Outcome::Rejected(e.to_string())
    }

    fn try_process(&mut self, payload: &Value) -> Result<usize, ReportError> {
        let report = TelemetryReport::parse(payload)?;

        let distance_km = self.observer.distance_km_to(report.lat, report.lon)?;
        let distance_miles = geo::to_miles(distance_km);
        let altitude_feet = geo::to_feet(report.alt_or_zero());

        let rate = self
            .tracks
            .last(&report.serial)
            .and_then(|previous| climb_rate(previous, &report));

        if log_enabled!(Level::Debug) {
            let climb = rate.map_or_else(|| "unknown".to_string(), |r| format!("{:.1}", r));
            debug!(
                "Sonde: {}, Dist: {:.1} mi, Alt: {:.0} ft, Climb: {} m/s",
                report.serial, distance_miles, altitude_feet, climb
            );
        }

        let serial = report.serial.clone();
        let subtype = report.subtype.clone();
        self.tracks.record(report);

        let mut alerts = 0;
        for criterion in self.criteria.iter().filter(|c| c.enabled) {
            if !criterion.matches(distance_miles, altitude_feet, rate) {
                continue;
            }
            if self.ledger.already_sent(&criterion.name, &serial) {
                continue;
            }

            let alert = AlertMatch {
                criterion: criterion.name.clone(),
                serial: serial.clone(),
                distance_miles,
                altitude_feet,
                climb_rate: rate,
                subtype: subtype.clone(),
            };

            info!("Sending alert for sonde {} - {}", serial, criterion.name);
            if let Err(e) = self
                .notifier
                .notify(Notification::for_match(&alert, &self.observer.name))
            {
                error!("Failed to queue alert for sonde {}: {}", serial, e);
            }
            self.ledger.mark_sent(&criterion.name, &serial);
            alerts += 1;
        }

        Ok(alerts)
    }
}
