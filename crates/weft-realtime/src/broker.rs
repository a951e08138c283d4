//! In-memory channel broker
//!
//! The in-process realization of the publish/subscribe contract: channels
//! are opaque strings, publish is fire-and-forget, order is preserved per
//! channel, and a slow subscriber lags instead of blocking dispatch.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;
use weft_transform::Transformation;

use crate::config::RealtimeConfig;

/// Payload delivered on a channel's `"transformation"` event
#[derive(Debug, Clone)]
pub struct TransformationMessage {
    /// Channel the message was published on
    pub channel: String,
    /// The recorded transformation
    pub transformation: Transformation,
}

/// Fire-and-forget channel fan-out
#[derive(Debug)]
pub struct Broker {
    channels: DashMap<String, broadcast::Sender<TransformationMessage>>,
    capacity: usize,
}

impl Broker {
    /// Create a broker
    #[must_use]
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: config.broadcast_capacity,
        }
    }

    /// Subscribe to a channel by its exact string form
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<TransformationMessage> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish a transformation to a channel
    ///
    /// Returns how many subscribers the message reached. No subscriber, no
    /// delivery, no error: transformations are fire-and-forget.
    pub fn publish(&self, channel: &str, transformation: Transformation) -> usize {
        let Some(sender) = self.channels.get(channel) else {
            debug!(channel, "publish on channel with no subscribers, dropping");
            return 0;
        };
        let message = TransformationMessage {
            channel: channel.to_string(),
            transformation,
        };
        match sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(channel, "all subscribers gone, dropping");
                0
            }
        }
    }

    /// Number of channels with at least one live subscriber
    #[must_use]
    pub fn active_channels(&self) -> usize {
        self.channels
            .iter()
            .filter(|entry| entry.value().receiver_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_transform::Recorder;

    fn transformation(id: &str) -> Transformation {
        Recorder::new().finalize(id)
    }

    #[tokio::test]
    async fn publish_reaches_exact_channel_only() {
        let broker = Broker::new(&RealtimeConfig::new());
        let mut rx = broker.subscribe("scope:post;mutation:changed::id:5");

        let reached = broker.publish("scope:post;mutation:changed::id:5", transformation("t1"));
        assert_eq!(reached, 1);
        // A different qualifier is a different channel entirely.
        let missed = broker.publish("scope:post;mutation:changed::id:6", transformation("t2"));
        assert_eq!(missed, 0);

        let message = rx.recv().await.unwrap();
        assert_eq!(message.transformation.id, "t1");
    }

    #[tokio::test]
    async fn same_channel_preserves_publish_order() {
        let broker = Broker::new(&RealtimeConfig::new());
        let mut rx = broker.subscribe("scope:post;mutation:changed");

        broker.publish("scope:post;mutation:changed", transformation("first"));
        broker.publish("scope:post;mutation:changed", transformation("second"));

        assert_eq!(rx.recv().await.unwrap().transformation.id, "first");
        assert_eq!(rx.recv().await.unwrap().transformation.id, "second");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let broker = Broker::new(&RealtimeConfig::new());
        assert_eq!(broker.publish("scope:post;mutation:changed", transformation("t1")), 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_others() {
        let broker = Broker::new(&RealtimeConfig::new());
        assert_eq!(broker.active_channels(), 0);
        let rx_gone = broker.subscribe("scope:post;mutation:changed");
        let mut rx_live = broker.subscribe("scope:post;mutation:changed");
        assert_eq!(broker.active_channels(), 1);
        drop(rx_gone);

        let reached = broker.publish("scope:post;mutation:changed", transformation("t1"));
        assert_eq!(reached, 1);
        assert_eq!(rx_live.recv().await.unwrap().transformation.id, "t1");

        drop(rx_live);
        assert_eq!(broker.active_channels(), 0);
    }
}
