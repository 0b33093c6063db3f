use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the service layer after successful mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequestCreated(Uuid),
    RequestDeleted(Uuid),
    RequestDelivered {
        request_id: Uuid,
        skipped_items: usize,
    },
    InventoryAdjusted {
        fraction_id: String,
        capacity: i32,
        new_quantity: i32,
    },
    EstablishmentCreated(Uuid),
    EstablishmentDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background consumer for domain events.
///
/// Runs until every sender is dropped. Delivery failures upstream are the
/// senders' concern; this loop only observes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::RequestCreated(id) => info!(request_id = %id, "request created"),
            Event::RequestDeleted(id) => info!(request_id = %id, "request deleted"),
            Event::RequestDelivered {
                request_id,
                skipped_items,
            } => {
                if *skipped_items > 0 {
                    warn!(
                        request_id = %request_id,
                        skipped_items,
                        "request delivered with malformed items skipped"
                    );
                } else {
                    info!(request_id = %request_id, "request delivered");
                }
            }
            Event::InventoryAdjusted {
                fraction_id,
                capacity,
                new_quantity,
            } => info!(
                fraction_id = %fraction_id,
                capacity,
                new_quantity,
                "inventory level adjusted"
            ),
            Event::EstablishmentCreated(id) => info!(establishment_id = %id, "establishment created"),
            Event::EstablishmentDeleted(id) => info!(establishment_id = %id, "establishment deleted"),
        }
    }
    info!("event channel closed; stopping event processor");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::RequestCreated(Uuid::new_v4())).await.is_err());
    }

    #[tokio::test]
    async fn events_serialize_for_audit_sinks() {
        let event = Event::InventoryAdjusted {
            fraction_id: "VIDRIO".into(),
            capacity: 240,
            new_quantity: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("InventoryAdjusted"));
    }
}
