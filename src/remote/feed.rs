use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::session::SessionConfig;

const TABLE_TOPIC: &str = "realtime:public:time_logs";
const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

/// Subscription to the hosted table's change events. The payload of a change
/// is never inspected; every event only bumps the invalidation counter so
/// that watchers refetch.
pub struct ChangeFeed {
    session: SessionConfig,
}

impl ChangeFeed {
    pub fn new(session: SessionConfig) -> Self {
        Self { session }
    }

    /// Creates the invalidation channel watchers subscribe to.
    pub fn invalidation_channel() -> (watch::Sender<u64>, watch::Receiver<u64>) {
        watch::channel(0)
    }

    /// Runs the subscription until cancelled. Joins the table topic, answers
    /// the channel service's heartbeat contract and bumps `notify` on every
    /// change event.
    pub async fn run(
        self,
        notify: watch::Sender<u64>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let url = self.session.realtime_url();
        let (stream, _) = connect_async(&url)
            .await
            .with_context(|| format!("failed to connect to realtime feed at {url}"))?;
        info!("Connected to realtime feed");

        let (mut sink, mut source) = stream.split();

        let join = json!({
            "topic": TABLE_TOPIC,
            "event": "phx_join",
            "payload": {},
            "ref": "1",
        });
        sink.send(Message::Text(join.to_string())).await?;

        let mut heartbeat = tokio::time::interval(HEARTBEAT_PERIOD);
        let mut heartbeat_ref = 1u64;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }
                _ = heartbeat.tick() => {
                    heartbeat_ref += 1;
                    let message = json!({
                        "topic": "phoenix",
                        "event": "heartbeat",
                        "payload": {},
                        "ref": heartbeat_ref.to_string(),
                    });
                    sink.send(Message::Text(message.to_string())).await?;
                }
                message = source.next() => {
                    match message {
                        Some(Ok(Message::Text(raw))) => {
                            if is_change_event(&raw) {
                                debug!("Change event received, invalidating");
                                notify.send_modify(|v| *v += 1);
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("Realtime feed error {e}");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Realtime feed closed by remote");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// A frame counts as a change when it belongs to the table topic and is not
/// one of the protocol's own events. The change payload itself is ignored.
fn is_change_event(raw: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return false;
    };
    let topic = value.get("topic").and_then(|v| v.as_str());
    let event = value.get("event").and_then(|v| v.as_str());
    topic == Some(TABLE_TOPIC) && !matches!(event, Some("phx_reply") | Some("phx_close") | None)
}
