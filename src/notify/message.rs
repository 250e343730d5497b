use crate::telemetry::AlertMatch;

const TRACKER_URL: &str = "https://sondehub.org/?sonde=";

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn for_match(alert: &AlertMatch, observer_name: &str) -> Self {
        let title = format!("🎈 SondeAlert: {}", alert.criterion);

        let mut lines = vec![
            format!("Radiosonde {} detected near {}!", alert.serial, observer_name),
            format!("Distance: {:.1} miles", alert.distance_miles),
            format!("Altitude: {:.0} ft", alert.altitude_feet),
        ];

        if let Some(rate) = alert.climb_rate {
            let status = if rate < 0.0 { "descending" } else { "ascending" };
            lines.push(format!("Vertical speed: {:.1} m/s ({})", rate, status));
        }

        if let Some(subtype) = &alert.subtype {
            lines.push(format!("Type: {}", subtype));
        }

        lines.push(format!("\nTrack it: {}{}", TRACKER_URL, alert.serial));

        Self {
            title,
            body: lines.join("\n"),
        }
    }
}
