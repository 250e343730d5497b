use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Transport};
use std::time::Duration;

use super::ReportSource;

const SONDEHUB_WS_URL: &str = "wss://ws-reader.v2.sondehub.org:443/";
const SONDEHUB_WS_PORT: u16 = 443;
const KEEP_ALIVE: Duration = Duration::from_secs(20);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_CAPACITY: usize = 16;
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Live SondeHub telemetry over MQTT-over-websockets.
pub struct SondeHubStream {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Vec<String>,
    closed: bool,
}

impl SondeHubStream {
    /// Subscribes to every sonde when `serials` is empty.
    pub fn connect(serials: &[String]) -> Self {
        let client_id = format!("sonde-alert-{}", uuid::Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, SONDEHUB_WS_URL, SONDEHUB_WS_PORT);
        options.set_transport(Transport::wss_with_default_config());
        options.set_keep_alive(KEEP_ALIVE);

        info!("Connecting to SondeHub stream at {}", SONDEHUB_WS_URL);
        Self::with_options(options, topics_for(serials))
    }

    fn with_options(options: MqttOptions, topics: Vec<String>) -> Self {
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        Self {
            client,
            eventloop,
            topics,
            closed: false,
        }
    }

    /// Polls until the queued DISCONNECT has gone out; requests are only
    /// written while the event loop is driven.
    async fn flush_disconnect(&mut self) {
        let flushed = tokio::time::timeout(DISCONNECT_TIMEOUT, async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("SondeHub connection ended during disconnect: {}", e);
                        break;
                    }
                }
            }
        })
        .await;

        if flushed.is_err() {
            warn!("Timed out sending disconnect to SondeHub");
        }
    }

    fn subscribe_all(&self) {
        for topic in &self.topics {
            match self.client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                Ok(()) => debug!("Subscribed to {}", topic),
                Err(e) => warn!("Failed to subscribe to {}: {}", topic, e),
            }
        }
    }
}

fn topics_for(serials: &[String]) -> Vec<String> {
    if serials.is_empty() {
        return vec!["sondes/#".to_string()];
    }
    serials.iter().map(|s| format!("sondes/{}", s)).collect()
}

impl ReportSource for SondeHubStream {
    async fn next_report(&mut self) -> Option<Vec<u8>> {
        while !self.closed {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Some(publish.payload.to_vec());
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Sessions are clean, so every (re)connect needs fresh subscriptions.
                    info!("Connected to SondeHub stream");
                    self.subscribe_all();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("SondeHub connection error: {}", e);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
        None
    }

    async fn close(&mut self) {
        self.closed = true;
        match self.client.try_disconnect() {
            Ok(()) => self.flush_disconnect().await,
            Err(e) => debug!("Disconnect request not sent: {}", e),
        }
        info!("SondeHub stream closed");
    }
}
