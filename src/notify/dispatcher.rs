use log::{debug, error, info};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::error::NotifyError;
use super::message::Notification;
use super::target::Target;
use super::Notifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Fans a notification out to every configured target.
pub struct Dispatcher {
    client: reqwest::Client,
    targets: Vec<Target>,
}

impl Dispatcher {
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Result<Self, NotifyError> {
        let targets = urls
            .iter()
            .map(|u| u.as_ref().parse())
            .collect::<Result<Vec<Target>, _>>()?;
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, targets })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Delivery failures are logged, never retried. Returns how many
    /// targets accepted the notification.
    pub async fn notify(&self, notification: &Notification) -> usize {
        let mut sends = JoinSet::new();
        for target in self.targets.iter().cloned() {
            let client = self.client.clone();
            let notification = notification.clone();
            sends.spawn(async move {
                let result = send(&client, &target, &notification).await;
                (target, result)
            });
        }

        let mut delivered = 0;
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((target, Ok(()))) => {
                    debug!("Delivered '{}' via {} ({})", notification.title, target, target.host());
                    delivered += 1;
                }
                Ok((target, Err(e))) => {
                    error!("Failed to deliver via {} ({}): {}", target, target.host(), e)
                }
                Err(e) => error!("Notification task failed: {}", e),
            }
        }
        delivered
    }

    /// Drains queued notifications until every sender is dropped.
    pub async fn run(self, mut queue: mpsc::UnboundedReceiver<Notification>) {
        while let Some(notification) = queue.recv().await {
            let delivered = self.notify(&notification).await;
            info!(
                "Notification '{}' delivered to {}/{} targets",
                notification.title,
                delivered,
                self.targets.len()
            );
        }
        debug!("Notification queue closed");
    }
}

async fn send(client: &reqwest::Client, target: &Target, notification: &Notification) -> Result<(), NotifyError> {
    let request = match target {
        Target::Json { url } => client.post(url.clone()).json(&json!({
            "version": "1.0",
            "title": notification.title,
            "message": notification.body,
            "type": "info",
        })),
        Target::Ntfy { server, topic } => client.post(server.clone()).json(&json!({
            "topic": topic,
            "title": notification.title,
            "message": notification.body,
        })),
        Target::Discord { url } => client.post(url.clone()).json(&json!({
            "content": format!("**{}**\n{}", notification.title, notification.body),
        })),
    };

    request.send().await?.error_for_status()?;
    Ok(())
}

/// Hands notifications from the synchronous pipeline to a `Dispatcher` task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    queue: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (queue, rx) = mpsc::unbounded_channel();
        (Self { queue }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.queue
            .send(notification)
            .map_err(|_| NotifyError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::capture_requests;
    use reqwest::Url;

    fn notification() -> Notification {
        Notification {
            title: "🎈 SondeAlert: close".to_string(),
            body: "Radiosonde S1 detected near Boulder!".to_string(),
        }
    }

    #[test]
    fn from_urls_parses_every_target() {
        let dispatcher =
            Dispatcher::from_urls(&["ntfy://balloons", "discord://1/2", "json://localhost/hook"]).unwrap();
        let kinds: Vec<String> = dispatcher.targets().iter().map(|t| t.to_string()).collect();
        assert_eq!(kinds, vec!["ntfy", "discord", "json"]);
    }

    #[test]
    fn from_urls_fails_on_any_bad_url() {
        assert!(Dispatcher::from_urls(&["ntfy://balloons", "tgram://bot/chat"]).is_err());
    }

    #[tokio::test]
    async fn channel_notifier_queues_in_order() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        let mut second = notification();
        second.title = "🎈 SondeAlert: rising".to_string();

        notifier.notify(notification()).unwrap();
        notifier.notify(second.clone()).unwrap();

        assert_eq!(rx.recv().await, Some(notification()));
        assert_eq!(rx.recv().await, Some(second));
    }

    #[tokio::test]
    async fn channel_notifier_reports_closed_queue() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        assert!(matches!(
            notifier.notify(notification()),
            Err(NotifyError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn unreachable_target_counts_as_undelivered() {
        // Port 9 on localhost refuses connections.
        let dispatcher = Dispatcher::from_urls(&["json://127.0.0.1:9/hook"]).unwrap();
        assert_eq!(dispatcher.notify(&notification()).await, 0);
    }

    fn has_header(headers: &[String], expected: &str) -> bool {
        headers.iter().any(|h| h == expected)
    }

    #[tokio::test]
    async fn json_target_posts_apprise_payload() {
        let (port, mut requests) = capture_requests().await;
        let dispatcher = Dispatcher::from_urls(&[format!("json://127.0.0.1:{}/hooks/sonde", port)]).unwrap();

        assert_eq!(dispatcher.notify(&notification()).await, 1);

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/hooks/sonde");
        assert!(has_header(&request.headers, "content-type: application/json"));
        assert_eq!(
            request.json(),
            json!({
                "version": "1.0",
                "title": "🎈 SondeAlert: close",
                "message": "Radiosonde S1 detected near Boulder!",
                "type": "info",
            })
        );
    }

    #[tokio::test]
    async fn ntfy_target_publishes_json_to_server_root() {
        let (port, mut requests) = capture_requests().await;
        let dispatcher = Dispatcher::from_urls(&[format!("ntfy://127.0.0.1:{}/sondes", port)]).unwrap();

        assert_eq!(dispatcher.notify(&notification()).await, 1);

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/");
        assert!(has_header(&request.headers, "content-type: application/json"));
        assert_eq!(
            request.json(),
            json!({
                "topic": "sondes",
                "title": "🎈 SondeAlert: close",
                "message": "Radiosonde S1 detected near Boulder!",
            })
        );
    }

    #[tokio::test]
    async fn discord_target_posts_content() {
        let (port, mut requests) = capture_requests().await;
        let target = Target::Discord {
            url: Url::parse(&format!("http://127.0.0.1:{}/api/webhooks/1234/abcd", port)).unwrap(),
        };
        let client = reqwest::Client::new();

        send(&client, &target, &notification()).await.unwrap();

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/webhooks/1234/abcd");
        assert_eq!(
            request.json(),
            json!({
                "content": "**🎈 SondeAlert: close**\nRadiosonde S1 detected near Boulder!",
            })
        );
    }

    #[tokio::test]
    async fn every_target_receives_the_notification() {
        let (port, mut requests) = capture_requests().await;
        let dispatcher = Dispatcher::from_urls(&[
            format!("json://127.0.0.1:{}/a", port),
            format!("json://127.0.0.1:{}/b", port),
        ])
        .unwrap();

        assert_eq!(dispatcher.notify(&notification()).await, 2);

        let mut paths = vec![
            requests.recv().await.unwrap().path,
            requests.recv().await.unwrap().path,
        ];
        paths.sort();
        assert_eq!(paths, vec!["/a", "/b"]);
    }
}
