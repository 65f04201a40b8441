use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use shared::StockEvent;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Fire-and-forget sink for stock notifications.
///
/// Only called after the order transaction has committed. Implementations
/// must not block and must not report failures back to the order path.
pub trait StockEventPublisher: Send + Sync {
    fn publish(&self, event: StockEvent);
}

/// Publishes JSON records keyed by product id to a Kafka topic.
pub struct KafkaStockPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaStockPublisher {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }

    pub fn connect(brokers: &str, topic: String) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;
        Ok(Self::new(producer, topic))
    }
}

impl StockEventPublisher for KafkaStockPublisher {
    fn publish(&self, event: StockEvent) {
        let producer = self.producer.clone();
        let topic = self.topic.clone();

        tokio::spawn(async move {
            let json = match event.to_payload() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize {} event: {}", event.event_type(), e);
                    return;
                }
            };
            let key = event.product_id().to_string();
            let record = FutureRecord::to(&topic).payload(&json).key(&key);

            match producer.send(record, Duration::from_secs(5)).await {
                Ok(_) => info!("Published {} for product {}", event.event_type(), key),
                Err((e, _)) => error!("Failed to publish {} for product {}: {}", event.event_type(), key, e),
            }
        });
    }
}

/// Used when no broker is configured: the event only reaches the log.
pub struct LogStockPublisher;

impl StockEventPublisher for LogStockPublisher {
    fn publish(&self, event: StockEvent) {
        info!(
            event_type = event.event_type(),
            product_id = %event.product_id(),
            "Stock event"
        );
    }
}

/// Forwards events to an in-process channel.
pub struct ChannelStockPublisher {
    sender: mpsc::UnboundedSender<StockEvent>,
}

impl ChannelStockPublisher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StockEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StockEventPublisher for ChannelStockPublisher {
    fn publish(&self, event: StockEvent) {
        if self.sender.send(event).is_err() {
            error!("Stock event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn channel_publisher_delivers_in_order() {
        let (publisher, mut receiver) = ChannelStockPublisher::channel();
        let product_id = Uuid::new_v4();

        publisher.publish(StockEvent::Decremented {
            product_id,
            size_id: 1,
            quantity: 2,
            order_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        });
        publisher.publish(StockEvent::SoldOut {
            product_id,
            occurred_at: Utc::now(),
        });

        assert!(matches!(receiver.recv().await, Some(StockEvent::Decremented { quantity: 2, .. })));
        assert!(matches!(receiver.recv().await, Some(StockEvent::SoldOut { .. })));
    }

    #[test]
    fn channel_publisher_survives_a_dropped_receiver() {
        let (publisher, receiver) = ChannelStockPublisher::channel();
        drop(receiver);
        publisher.publish(StockEvent::SoldOut {
            product_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        });
    }
}
