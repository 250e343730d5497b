use std::future::Future;

use log::{debug, error, info};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinError;

use crate::alert::Criterion;
use crate::config::{Config, ConfigError};
use crate::geo::Observer;
use crate::notify::{ChannelNotifier, Dispatcher, Notifier, NotifyError};
use crate::stream::{ReportSource, StreamError};
use crate::telemetry::{Outcome, Processor};

const REPORT_QUEUE: usize = 1024;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("notification setup failed: {0}")]
    Notify(#[from] NotifyError),
    #[error("telemetry stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub payloads: usize,
    pub tracked: usize,
    pub alerts: usize,
}

/// Wires a report source to the processor and the dispatcher, and keeps
/// them running until the source ends or shutdown is requested.
pub struct Session {
    observer: Observer,
    criteria: Vec<Criterion>,
    dispatcher: Dispatcher,
    check_interval: std::time::Duration,
}

impl Session {
    pub fn new(config: Config) -> Result<Self, SessionError> {
        let observer = config.observer()?;
        let dispatcher = Dispatcher::from_urls(&config.notifications.apprise_urls)?;
        Ok(Self {
            observer,
            check_interval: config.check_interval(),
            criteria: config.criteria,
            dispatcher,
        })
    }

    pub fn log_summary(&self) {
        info!(
            "Starting SondeAlert - monitoring for radiosondes near {}",
            self.observer.name
        );
        info!(
            "User location: ({}, {})",
            self.observer.latitude_deg, self.observer.longitude_deg
        );
        for target in self.dispatcher.targets() {
            info!("Notification target: {} ({})", target, target.host());
        }
        log_criteria(&self.criteria);
    }

    /// Runs until the source ends or Ctrl-C is received.
    pub async fn run<S: ReportSource + 'static>(self, source: S) -> Result<Stats, SessionError> {
        self.run_until(source, interrupted()).await
    }

    /// Runs until the source ends or `shutdown` completes. Reports already
    /// received are processed and their alerts delivered before returning.
    pub async fn run_until<S, F>(self, source: S, shutdown: F) -> Result<Stats, SessionError>
    where
        S: ReportSource + 'static,
        F: Future<Output = ()>,
    {
        let (notifier, queue) = ChannelNotifier::channel();
        let dispatch = tokio::spawn(self.dispatcher.run(queue));

        let (report_tx, report_rx) = mpsc::channel(REPORT_QUEUE);
        let (stats_tx, stats_rx) = watch::channel(Stats::default());
        let processor = Processor::new(self.observer, self.criteria, notifier);
        let processing = tokio::spawn(process_reports(processor, report_rx, stats_tx));

        let (stop_tx, stop_rx) = oneshot::channel();
        let mut ingest = tokio::spawn(ingest(source, report_tx, stop_rx));

        info!(
            "Waiting for telemetry (status every {})",
            humantime::format_duration(self.check_interval)
        );
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.tick().await;
        tokio::pin!(shutdown);

        let stream_ended = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = *stats_rx.borrow();
                    debug!(
                        "Status: {} payloads, {} sondes tracked, {} alerts sent",
                        stats.payloads, stats.tracked, stats.alerts
                    );
                }
                _ = &mut shutdown => {
                    info!("Shutting down SondeAlert");
                    break false;
                }
                joined = &mut ingest => {
                    joined?;
                    info!("Telemetry stream ended");
                    break true;
                }
            }
        };

        if !stream_ended {
            let _ = stop_tx.send(());
            ingest.await?;
        }

        // Drains queued reports, then drops the notifier so the dispatcher can finish.
        let stats = processing.await?;
        dispatch.await?;

        info!(
            "Processed {} payloads from {} sondes, {} alerts sent",
            stats.payloads, stats.tracked, stats.alerts
        );
        Ok(stats)
    }
}

pub fn log_criteria(criteria: &[Criterion]) {
    for criterion in criteria.iter().filter(|c| c.enabled) {
        info!("Alert criteria enabled: {}", criterion.name);
        for (key, value) in criterion.bounds() {
            info!("  {}: {}", key, value);
        }
    }
}

/// Completes on Ctrl-C. If the handler cannot be installed the session keeps
/// running until the stream ends.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupt: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn ingest<S: ReportSource>(
    mut source: S,
    reports: mpsc::Sender<Vec<u8>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let payload = tokio::select! {
            payload = source.next_report() => payload,
            _ = &mut stop_rx => break,
        };
        let Some(payload) = payload else {
            break;
        };
        if reports.send(payload).await.is_err() {
            break;
        }
    }
    source.close().await;
}

async fn process_reports<N: Notifier>(
    mut processor: Processor<N>,
    mut reports: mpsc::Receiver<Vec<u8>>,
    stats: watch::Sender<Stats>,
) -> Stats {
    let mut current = Stats::default();
    while let Some(payload) = reports.recv().await {
        let outcomes = processor.process_raw(&payload);
        let rejected = outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Rejected(_)))
            .count();
        if rejected > 0 {
            debug!("{} of {} reports in payload rejected", rejected, outcomes.len());
        }

        current = Stats {
            payloads: current.payloads + 1,
            tracked: processor.tracked(),
            alerts: processor.alerts_sent(),
        };
        stats.send_replace(current);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::capture_requests;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Recorded {
        payloads: VecDeque<Vec<u8>>,
        closed: Arc<AtomicBool>,
    }

    impl ReportSource for Recorded {
        async fn next_report(&mut self) -> Option<Vec<u8>> {
            self.payloads.pop_front()
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    /// Yields a fresh nearby sonde forever, signalling once `limit` have
    /// been handed out and then stalling.
    struct Endless {
        sent: usize,
        limit: usize,
        reached: Option<oneshot::Sender<()>>,
        closed: Arc<AtomicBool>,
    }

    impl ReportSource for Endless {
        async fn next_report(&mut self) -> Option<Vec<u8>> {
            if self.sent == self.limit {
                return std::future::pending().await;
            }
            self.sent += 1;
            if self.sent == self.limit {
                if let Some(reached) = self.reached.take() {
                    let _ = reached.send(());
                }
            }
            let payload = format!(
                r#"{{"serial":"E{}","lat":40.1,"lon":-105.1,"alt":3000,"time":1000}}"#,
                self.sent
            );
            Some(payload.into_bytes())
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn config() -> Config {
        r#"
location: {latitude: 40.0, longitude: -105.0, name: Boulder}
notifications: {apprise_urls: ["json://127.0.0.1:9/hook"]}
app: {check_interval_seconds: 1}
criteria:
  - {name: close, distance_miles: 50, altitude_feet_max: 20000}
  - {name: rising, altitude_feet_min: 10000, climb_rate_min: 20}
"#
        .parse()
        .unwrap()
    }

    #[tokio::test]
    async fn recorded_stream_runs_to_completion() {
        let closed = Arc::new(AtomicBool::new(false));
        let source = Recorded {
            payloads: [
                r#"{"serial":"S1","lat":40.1,"lon":-105.1,"alt":3000,"time":1000}"#,
                r#"{"serial":"S1","lat":40.1,"lon":-105.1,"alt":3300,"time":1010}"#,
                r#"{"lat":40.1}"#,
                r#"[{"serial":"S2","lat":45.0,"lon":-105.0}]"#,
            ]
            .into_iter()
            .map(|p| p.as_bytes().to_vec())
            .collect(),
            closed: closed.clone(),
        };

        let session = Session::new(config()).unwrap();
        let stats = session.run(source).await.unwrap();

        assert_eq!(
            stats,
            Stats {
                payloads: 4,
                tracked: 2,
                alerts: 2
            }
        );
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn shutdown_drains_received_reports() {
        const LIMIT: usize = 5;
        let (port, mut requests) = capture_requests().await;
        let mut config = config();
        config.notifications.apprise_urls = vec![format!("json://127.0.0.1:{}/hook", port)];

        let (reached_tx, reached_rx) = oneshot::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let source = Endless {
            sent: 0,
            limit: LIMIT,
            reached: Some(reached_tx),
            closed: closed.clone(),
        };

        let session = Session::new(config).unwrap();
        let stats = session
            .run_until(source, async {
                let _ = reached_rx.await;
            })
            .await
            .unwrap();

        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(stats.payloads, LIMIT);
        assert_eq!(stats.tracked, LIMIT);
        assert_eq!(stats.alerts, LIMIT);

        let mut messages = Vec::new();
        for _ in 0..LIMIT {
            let request = tokio::time::timeout(Duration::from_secs(5), requests.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(request.path, "/hook");
            let body = request.json();
            assert_eq!(body["title"], "🎈 SondeAlert: close");
            messages.push(body["message"].as_str().unwrap().to_string());
        }
        for n in 1..=LIMIT {
            let serial = format!("Radiosonde E{} detected", n);
            assert!(messages.iter().any(|m| m.contains(&serial)), "no alert for E{}", n);
        }
        assert!(requests.try_recv().is_err());
    }

    #[test]
    fn unsupported_notification_url_fails_setup() {
        let mut config = config();
        config.notifications.apprise_urls = vec!["carrier-pigeon://coop".to_string()];
        assert!(matches!(
            Session::new(config),
            Err(SessionError::Notify(NotifyError::UnsupportedScheme(_)))
        ));
    }
}
