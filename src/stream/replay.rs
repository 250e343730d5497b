use log::{error, info};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use super::error::StreamError;
use super::ReportSource;

/// Replays a recorded stream from a JSON-lines file, one payload per line.
pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    delivered: usize,
}

impl ReplaySource {
    pub async fn open(path: &Path) -> Result<Self, StreamError> {
        let file = File::open(path).await?;
        info!("Replaying telemetry from {}", path.display());
        Ok(Self {
            lines: BufReader::new(file).lines(),
            delivered: 0,
        })
    }
}

impl ReportSource for ReplaySource {
    async fn next_report(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    self.delivered += 1;
                    return Some(line.into_bytes());
                }
                Ok(None) => return None,
                Err(e) => {
                    error!("Replay read failed after {} payloads: {}", self.delivered, e);
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        info!("Replay closed after {} payloads", self.delivered);
    }
}
