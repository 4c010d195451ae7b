//! Position and alert records

use crate::market::round2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stocksim_common::events::AlertKind;
use uuid::Uuid;

/// Lifecycle of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Active,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Active => "ACTIVE",
            PositionStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(PositionStatus::Active),
            "CLOSED" => Some(PositionStatus::Closed),
            _ => None,
        }
    }
}

/// One simulated purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub transaction_id: u64,
    pub symbol: String,
    pub buy_price: f64,
    pub bought_at: DateTime<Utc>,
    pub status: PositionStatus,
    /// Latched once an alert fires; cleared by reset or a new simulation
    pub alert_sent: bool,
    pub current_price: f64,
    pub percent_change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<AlertKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_triggered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated_current_price: Option<f64>,
}

impl Position {
    pub fn open(transaction_id: u64, symbol: String, buy_price: f64, at: DateTime<Utc>) -> Self {
        Self {
            transaction_id,
            symbol,
            buy_price,
            bought_at: at,
            status: PositionStatus::Active,
            alert_sent: false,
            current_price: buy_price,
            percent_change: 0.0,
            alert_type: None,
            alert_triggered_at: None,
            simulated_current_price: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Copy of this position marked to `price`, leaving `self` untouched
    pub fn repriced(&self, price: f64) -> Self {
        Self {
            current_price: price,
            percent_change: round2(percent_change(self.buy_price, price)),
            ..self.clone()
        }
    }
}

/// Entry in a transaction's alert history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub alert_type: AlertKind,
    pub percent_change: f64,
    pub current_price: f64,
    pub buy_price: f64,
}

/// Alert as listed by `/alerts/latest`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestAlert {
    #[serde(flatten)]
    pub alert: AlertRecord,
    pub transaction_id: u64,
}

/// Percentage move from `buy` to `current`
pub fn percent_change(buy: f64, current: f64) -> f64 {
    (current - buy) / buy * 100.0
}

/// Alert direction for a move, if it reaches the threshold either way
pub fn classify_movement(percent: f64, threshold: f64) -> Option<AlertKind> {
    if percent >= threshold {
        Some(AlertKind::Profit)
    } else if percent <= -threshold {
        Some(AlertKind::Loss)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100.0, 105.0), 5.0);
        assert_eq!(percent_change(200.0, 190.0), -5.0);
        assert_eq!(percent_change(50.0, 50.0), 0.0);
    }

    #[test]
    fn test_classify_movement_boundaries() {
        assert_eq!(classify_movement(5.0, 5.0), Some(AlertKind::Profit));
        assert_eq!(classify_movement(-5.0, 5.0), Some(AlertKind::Loss));
        assert_eq!(classify_movement(4.99, 5.0), None);
        assert_eq!(classify_movement(-4.99, 5.0), None);
        assert_eq!(classify_movement(12.0, 10.0), Some(AlertKind::Profit));
    }

    #[test]
    fn test_repriced_keeps_original() {
        let position = Position::open(1, "TCS.NS".to_string(), 200.0, Utc::now());
        let marked = position.repriced(213.0);
        assert_eq!(marked.current_price, 213.0);
        assert_eq!(marked.percent_change, 6.5);
        assert_eq!(position.current_price, 200.0);
        assert_eq!(position.percent_change, 0.0);
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let position = Position::open(1, "TCS.NS".to_string(), 200.0, Utc::now());
        let json = serde_json::to_value(&position).unwrap();
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["alert_sent"], false);
        assert!(json.get("alert_type").is_none());
        assert!(json.get("simulated_current_price").is_none());
    }

    #[test]
    fn test_latest_alert_flattens_record() {
        let latest = LatestAlert {
            alert: AlertRecord {
                alert_id: Uuid::new_v4(),
                timestamp: Utc::now(),
                alert_type: AlertKind::Profit,
                percent_change: 6.0,
                current_price: 106.0,
                buy_price: 100.0,
            },
            transaction_id: 4,
        };
        let json = serde_json::to_value(&latest).unwrap();
        assert_eq!(json["type"], "PROFIT");
        assert_eq!(json["transaction_id"], 4);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(PositionStatus::parse("ACTIVE"), Some(PositionStatus::Active));
        assert_eq!(PositionStatus::parse("CLOSED"), Some(PositionStatus::Closed));
        assert_eq!(PositionStatus::parse("open"), None);
    }
}
