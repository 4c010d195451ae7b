//! Event types for the StockSim event system
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Direction of a threshold-crossing price movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    /// Price rose by at least the threshold
    Profit,
    /// Price fell by at least the threshold
    Loss,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Profit => "PROFIT",
            AlertKind::Loss => "LOSS",
        }
    }

    /// Human-facing movement label used in alert banners
    pub fn direction_text(&self) -> &'static str {
        match self {
            AlertKind::Profit => "GAIN",
            AlertKind::Loss => "LOSS",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "PROFIT" => Ok(AlertKind::Profit),
            "LOSS" => Ok(AlertKind::Loss),
            other => Err(crate::Error::InvalidInput(format!("Unknown alert kind: {}", other))),
        }
    }
}

/// StockSim event types
///
/// Every state change made by the API or the market monitor is emitted as one
/// of these. Serialized with an internal `type` tag so browsers can switch on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// A simulated purchase was recorded
    PositionOpened {
        transaction_id: u64,
        symbol: String,
        buy_price: f64,
        timestamp: DateTime<Utc>,
    },

    /// Monitor re-priced an active position
    PositionRepriced {
        transaction_id: u64,
        symbol: String,
        current_price: f64,
        percent_change: f64,
        /// Whether the price came from a simulation override
        simulated: bool,
        timestamp: DateTime<Utc>,
    },

    /// A position crossed the alert threshold
    AlertTriggered {
        alert_id: Uuid,
        transaction_id: u64,
        symbol: String,
        alert_type: AlertKind,
        percent_change: f64,
        current_price: f64,
        buy_price: f64,
        timestamp: DateTime<Utc>,
    },

    /// Alert latch cleared so the position can alert again
    AlertReset {
        transaction_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// Simulated price override installed
    SimulationSet {
        transaction_id: u64,
        simulated_current_price: f64,
        timestamp: DateTime<Utc>,
    },

    /// Simulated price override removed
    SimulationCleared {
        transaction_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// One monitoring pass finished
    ScanCompleted {
        positions_checked: usize,
        alerts_triggered: usize,
        timestamp: DateTime<Utc>,
    },
}

impl SimEvent {
    /// SSE `event:` field for this event
    pub fn event_type(&self) -> &'static str {
        match self {
            SimEvent::PositionOpened { .. } => "PositionOpened",
            SimEvent::PositionRepriced { .. } => "PositionRepriced",
            SimEvent::AlertTriggered { .. } => "AlertTriggered",
            SimEvent::AlertReset { .. } => "AlertReset",
            SimEvent::SimulationSet { .. } => "SimulationSet",
            SimEvent::SimulationCleared { .. } => "SimulationCleared",
            SimEvent::ScanCompleted { .. } => "ScanCompleted",
        }
    }
}

/// Broadcast bus for [`SimEvent`]s
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SimEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    ///
    /// ```
    /// use stocksim_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    pub fn emit(&self, event: SimEvent) -> Result<usize, broadcast::error::SendError<SimEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: SimEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(SimEvent::AlertReset {
            transaction_id: 3,
            timestamp: Utc::now(),
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            SimEvent::AlertReset { transaction_id, .. } => assert_eq!(transaction_id, 3),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_error() {
        let bus = EventBus::new(10);
        assert!(bus
            .emit(SimEvent::SimulationCleared {
                transaction_id: 1,
                timestamp: Utc::now(),
            })
            .is_err());
        // lossy variant swallows it
        bus.emit_lossy(SimEvent::SimulationCleared {
            transaction_id: 1,
            timestamp: Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_serialized_tag_and_alert_kind() {
        let event = SimEvent::AlertTriggered {
            alert_id: Uuid::new_v4(),
            transaction_id: 1,
            symbol: "TCS.NS".to_string(),
            alert_type: AlertKind::Loss,
            percent_change: -6.0,
            current_price: 94.0,
            buy_price: 100.0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AlertTriggered");
        assert_eq!(json["alert_type"], "LOSS");
        assert_eq!(event.event_type(), "AlertTriggered");
    }

    #[test]
    fn test_alert_kind_parse() {
        assert_eq!("PROFIT".parse::<AlertKind>().unwrap(), AlertKind::Profit);
        assert!("profit".parse::<AlertKind>().is_err());
        assert_eq!(AlertKind::Loss.direction_text(), "LOSS");
        assert_eq!(AlertKind::Profit.direction_text(), "GAIN");
    }
}
