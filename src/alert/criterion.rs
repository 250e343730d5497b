use serde::Deserialize;

/// A named alert rule. Every bound is optional; an absent bound leaves that
/// dimension unconstrained.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Criterion {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub distance_miles: Option<f64>,
    pub altitude_feet_min: Option<f64>,
    pub altitude_feet_max: Option<f64>,
    /// m/s, negative is descending.
    pub climb_rate_min: Option<f64>,
    pub climb_rate_max: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

impl Criterion {
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            distance_miles: None,
            altitude_feet_min: None,
            altitude_feet_max: None,
            climb_rate_min: None,
            climb_rate_max: None,
        }
    }

    /// Climb-rate bounds only apply when a climb rate is known; an unknown
    /// climb rate satisfies them.
    pub fn matches(&self, distance_miles: f64, altitude_feet: f64, climb_rate: Option<f64>) -> bool {
        if self.distance_miles.is_some_and(|max| distance_miles > max) {
            return false;
        }
        if self.altitude_feet_min.is_some_and(|min| altitude_feet < min) {
            return false;
        }
        if self.altitude_feet_max.is_some_and(|max| altitude_feet > max) {
            return false;
        }

        if let Some(rate) = climb_rate {
            if self.climb_rate_min.is_some_and(|min| rate < min) {
                return false;
            }
            if self.climb_rate_max.is_some_and(|max| rate > max) {
                return false;
            }
        }

        true
    }

    /// Configured bounds in declaration order, keyed by their config name.
    pub fn bounds(&self) -> Vec<(&'static str, f64)> {
        [
            ("distance_miles", self.distance_miles),
            ("altitude_feet_min", self.altitude_feet_min),
            ("altitude_feet_max", self.altitude_feet_max),
            ("climb_rate_min", self.climb_rate_min),
            ("climb_rate_max", self.climb_rate_max),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}
