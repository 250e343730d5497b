use reqwest::Url;
use std::str::FromStr;

use super::error::NotifyError;

const NTFY_PUBLIC_SERVER: &str = "https://ntfy.sh/";
const DISCORD_WEBHOOK_API: &str = "https://discord.com/api/webhooks";

/// A delivery destination parsed from an Apprise-style URL.
#[derive(Debug, Clone, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    /// `json://` / `jsons://`: Apprise JSON payload POSTed to the URL.
    Json { url: Url },
    /// `ntfy://[host/]topic` / `ntfys://`.
    Ntfy { server: Url, topic: String },
    /// `discord://webhook_id/webhook_token`.
    Discord { url: Url },
}

impl Target {
    /// Host the target talks to; safe to log (no tokens or paths).
    pub fn host(&self) -> &str {
        let url = match self {
            Target::Json { url } | Target::Discord { url } => url,
            Target::Ntfy { server, .. } => server,
        };
        url.host_str().unwrap_or_default()
    }
}

impl FromStr for Target {
    type Err = NotifyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| invalid(raw, "missing scheme"))?;

        match scheme.to_ascii_lowercase().as_str() {
            "json" => Ok(Target::Json {
                url: http_url("http", rest, raw)?,
            }),
            "jsons" => Ok(Target::Json {
                url: http_url("https", rest, raw)?,
            }),
            "ntfy" => parse_ntfy("http", rest, raw),
            "ntfys" => parse_ntfy("https", rest, raw),
            "discord" => parse_discord(rest, raw),
            other => Err(NotifyError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn invalid(raw: &str, reason: &str) -> NotifyError {
    NotifyError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    }
}

fn http_url(scheme: &str, rest: &str, raw: &str) -> Result<Url, NotifyError> {
    let url = Url::parse(&format!("{}://{}", scheme, rest)).map_err(|e| invalid(raw, &e.to_string()))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(raw, "missing host"));
    }
    Ok(url)
}

fn path_segments(rest: &str) -> Vec<&str> {
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_ntfy(scheme: &str, rest: &str, raw: &str) -> Result<Target, NotifyError> {
    match path_segments(rest).as_slice() {
        [topic] => Ok(Target::Ntfy {
            server: Url::parse(NTFY_PUBLIC_SERVER).map_err(|e| invalid(raw, &e.to_string()))?,
            topic: topic.to_string(),
        }),
        [host, topic] => Ok(Target::Ntfy {
            server: http_url(scheme, &format!("{}/", host), raw)?,
            topic: topic.to_string(),
        }),
        _ => Err(invalid(raw, "expected ntfy://[host/]topic")),
    }
}

fn parse_discord(rest: &str, raw: &str) -> Result<Target, NotifyError> {
    match path_segments(rest).as_slice() {
        [id, token] => {
            let url = Url::parse(&format!("{}/{}/{}", DISCORD_WEBHOOK_API, id, token))
                .map_err(|e| invalid(raw, &e.to_string()))?;
            Ok(Target::Discord { url })
        }
        _ => Err(invalid(raw, "expected discord://webhook_id/webhook_token")),
    }
}
