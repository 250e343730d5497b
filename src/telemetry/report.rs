use chrono::DateTime;
use serde_json::{Map, Value};

use super::error::ReportError;
use crate::geo;

const KNOWN_FIELDS: [&str; 7] = ["serial", "lat", "lon", "alt", "time", "datetime", "subtype"];

/// One validated position sample for a balloon.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReport {
    pub serial: String,
    pub lat: f64,
    pub lon: f64,
    /// Meters; `None` when the payload carried no altitude.
    pub alt: Option<f64>,
    /// Epoch seconds.
    pub time: Option<f64>,
    pub subtype: Option<String>,
    /// Fields the pipeline does not interpret, kept as received.
    #[allow(dead_code)]
    pub extra: Map<String, Value>,
}

impl TelemetryReport {
    pub fn parse(payload: &Value) -> Result<Self, ReportError> {
        let map = payload.as_object().ok_or(ReportError::NotAnObject)?;

        let serial = parse_serial(required(map, "serial")?)?;
        let lat = parse_number("lat", required(map, "lat")?)?;
        let lon = parse_number("lon", required(map, "lon")?)?;
        geo::check_point((lat, lon))?;

        let alt = optional(map, "alt")
            .map(|v| parse_number("alt", v))
            .transpose()?;

        let time = optional(map, "time")
            .and_then(|v| parse_number("time", v).ok())
            .or_else(|| optional(map, "datetime").and_then(parse_datetime));

        let subtype = optional(map, "subtype").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        let extra = map
            .iter()
            .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            serial,
            lat,
            lon,
            alt,
            time,
            subtype,
            extra,
        })
    }

    pub fn alt_or_zero(&self) -> f64 {
        self.alt.unwrap_or(0.0)
    }
}

fn optional<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn required<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, ReportError> {
    optional(map, key).ok_or(ReportError::MissingField(key))
}

fn invalid(field: &'static str, value: &Value) -> ReportError {
    ReportError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn parse_serial(value: &Value) -> Result<String, ReportError> {
    let serial = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(invalid("serial", other)),
    };
    if serial.is_empty() {
        return Err(invalid("serial", value));
    }
    Ok(serial)
}

/// Accepts JSON numbers and numeric strings.
fn parse_number(field: &'static str, value: &Value) -> Result<f64, ReportError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(field, value))
}

fn parse_datetime(value: &Value) -> Option<f64> {
    let dt = DateTime::parse_from_rfc3339(value.as_str()?).ok()?;
    Some(dt.timestamp_millis() as f64 / 1000.0)
}
