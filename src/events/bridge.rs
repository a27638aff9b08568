use log::warn;
use tokio::sync::mpsc;

use super::StatusEvent;

/// Host side of the bridge, handed to whatever receives pushes from the
/// executor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl EventSender {
    /// Returns false once the receiving session is gone
    pub fn send(&self, event: impl Into<StatusEvent>) -> bool {
        self.tx.send(event.into()).is_ok()
    }

    /// Forward a raw JSON payload. Malformed payloads are logged and dropped.
    pub fn send_json(&self, payload: &str) -> bool {
        match StatusEvent::from_json(payload) {
            Ok(event) => self.send(event),
            Err(e) => {
                warn!("Dropping malformed status payload: {}", e);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Session side of the bridge: an ordered queue of inbound events.
#[derive(Debug)]
pub struct EventBridge {
    rx: mpsc::UnboundedReceiver<StatusEvent>,
}

impl EventBridge {
    pub fn channel() -> (EventSender, EventBridge) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSender { tx }, EventBridge { rx })
    }

    /// Next event, waiting if none is queued. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.rx.recv().await
    }

    /// Everything queued right now, without waiting
    pub fn drain(&mut self) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NodeStatusEvent;
    use crate::graph::NodeStatus;

    #[tokio::test]
    async fn test_events_arrive_in_send_order() {
        let (sender, mut bridge) = EventBridge::channel();

        assert!(sender.send(NodeStatusEvent::new(1, NodeStatus::Pending)));
        assert!(sender.send(NodeStatusEvent::new(1, NodeStatus::Running)));
        assert!(sender.send_json(r#"{"type": "node_status", "node_id": 1, "status": "complete"}"#));
        assert!(!sender.send_json("nonsense"));

        let statuses: Vec<NodeStatus> = bridge
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::NodeStatus(s) => Some(s.status),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![NodeStatus::Pending, NodeStatus::Running, NodeStatus::Complete]
        );
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_drop() {
        let (sender, mut bridge) = EventBridge::channel();
        drop(sender);
        assert!(bridge.recv().await.is_none());
    }
}
