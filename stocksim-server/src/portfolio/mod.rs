//! Simulated portfolio
//!
//! Holds every position and its alert history behind one async lock. Each
//! mutation emits a [`SimEvent`] and, when a database is attached, is
//! written through to SQLite while the lock is still held so the journal
//! sees changes in the same order as memory.

mod position;

pub use position::{
    classify_movement, percent_change, AlertRecord, LatestAlert, Position, PositionStatus,
};

use crate::db;
use crate::market::round2;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use stocksim_common::{events::SimEvent, Error, EventBus, Result};
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

/// Default number of entries returned by [`Portfolio::latest_alerts`]
pub const LATEST_ALERTS_LIMIT: usize = 10;

#[derive(Debug, Default)]
struct Ledger {
    positions: BTreeMap<u64, Position>,
    alert_history: BTreeMap<u64, Vec<AlertRecord>>,
}

/// Outcome of marking a position to a new price
#[derive(Debug, Clone)]
pub struct PriceUpdate {
    /// Position after the update
    pub position: Position,
    /// Alert fired by this update, if any
    pub alert: Option<AlertRecord>,
}

/// What a simulated price would do to a position
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationPreview {
    pub buy_price: f64,
    pub simulated_current_price: f64,
    pub expected_percent_change: f64,
}

pub struct Portfolio {
    ledger: RwLock<Ledger>,
    db: Option<SqlitePool>,
    events: EventBus,
}

impl Portfolio {
    /// Memory-only portfolio
    pub fn new(events: EventBus) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            db: None,
            events,
        }
    }

    /// Portfolio journaled to `pool`, pre-loaded with what the journal holds
    pub async fn with_database(pool: SqlitePool, events: EventBus) -> Result<Self> {
        let mut ledger = Ledger::default();
        for position in db::load_positions(&pool).await? {
            ledger.positions.insert(position.transaction_id, position);
        }
        for (transaction_id, alert) in db::load_alerts(&pool).await? {
            ledger
                .alert_history
                .entry(transaction_id)
                .or_default()
                .push(alert);
        }
        info!(
            "Restored {} positions and {} alerts from database",
            ledger.positions.len(),
            ledger.alert_history.values().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            ledger: RwLock::new(ledger),
            db: Some(pool),
            events,
        })
    }

    async fn persist_position(&self, position: &Position) {
        if let Some(pool) = &self.db {
            if let Err(e) = db::upsert_position(pool, position).await {
                error!(
                    transaction_id = position.transaction_id,
                    "Failed to persist position: {}", e
                );
            }
        }
    }

    async fn persist_alert(&self, transaction_id: u64, alert: &AlertRecord) {
        if let Some(pool) = &self.db {
            if let Err(e) = db::insert_alert(pool, transaction_id, alert).await {
                error!(transaction_id, "Failed to persist alert: {}", e);
            }
        }
    }

    /// Record a purchase of `symbol` at `price`
    ///
    /// Transaction ids run 1, 2, 3, ... in purchase order.
    pub async fn open_position(&self, symbol: &str, price: f64) -> Position {
        let mut ledger = self.ledger.write().await;
        let transaction_id = ledger.positions.len() as u64 + 1;
        let position = Position::open(transaction_id, symbol.to_string(), price, Utc::now());
        ledger.positions.insert(transaction_id, position.clone());
        self.persist_position(&position).await;
        drop(ledger);

        self.events.emit_lossy(SimEvent::PositionOpened {
            transaction_id,
            symbol: position.symbol.clone(),
            buy_price: price,
            timestamp: position.bought_at,
        });
        position
    }

    pub async fn positions(&self) -> BTreeMap<u64, Position> {
        self.ledger.read().await.positions.clone()
    }

    pub async fn position(&self, transaction_id: u64) -> Option<Position> {
        self.ledger.read().await.positions.get(&transaction_id).cloned()
    }

    pub async fn active_positions(&self) -> Vec<Position> {
        self.ledger
            .read()
            .await
            .positions
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect()
    }

    pub async fn total_positions(&self) -> usize {
        self.ledger.read().await.positions.len()
    }

    pub async fn active_count(&self) -> usize {
        self.ledger
            .read()
            .await
            .positions
            .values()
            .filter(|p| p.is_active())
            .count()
    }

    pub async fn total_alerts(&self) -> usize {
        self.ledger
            .read()
            .await
            .alert_history
            .values()
            .map(Vec::len)
            .sum()
    }

    pub async fn alert_history(&self) -> BTreeMap<u64, Vec<AlertRecord>> {
        self.ledger.read().await.alert_history.clone()
    }

    /// Most recent alert of each transaction, newest first, at most `limit`
    ///
    /// Also returns how many transactions have alerted at all.
    pub async fn latest_alerts(&self, limit: usize) -> (Vec<LatestAlert>, usize) {
        let ledger = self.ledger.read().await;
        let mut latest: Vec<LatestAlert> = ledger
            .alert_history
            .iter()
            .filter_map(|(transaction_id, alerts)| {
                alerts.last().map(|alert| LatestAlert {
                    alert: alert.clone(),
                    transaction_id: *transaction_id,
                })
            })
            .collect();
        let total = latest.len();

        latest.sort_by(|a, b| b.alert.timestamp.cmp(&a.alert.timestamp));
        latest.truncate(limit);
        (latest, total)
    }

    /// Clear the alert latch so the next threshold crossing alerts again
    pub async fn reset_alert(&self, transaction_id: u64) -> Result<Position> {
        let mut ledger = self.ledger.write().await;
        let position = ledger
            .positions
            .get_mut(&transaction_id)
            .ok_or_else(transaction_not_found)?;
        position.alert_sent = false;
        position.alert_type = None;
        position.alert_triggered_at = None;
        let position = position.clone();
        self.persist_position(&position).await;
        drop(ledger);

        self.events.emit_lossy(SimEvent::AlertReset {
            transaction_id,
            timestamp: Utc::now(),
        });
        Ok(position)
    }

    /// Make the monitor use `price` for this position instead of live data
    ///
    /// Also clears the alert latch so the simulated move can alert.
    pub async fn set_simulated_price(
        &self,
        transaction_id: u64,
        price: f64,
    ) -> Result<SimulationPreview> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "simulated_current_price must be a positive number, got {}",
                price
            )));
        }

        let mut ledger = self.ledger.write().await;
        let position = ledger
            .positions
            .get_mut(&transaction_id)
            .ok_or_else(transaction_not_found)?;
        position.simulated_current_price = Some(price);
        position.alert_sent = false;
        let preview = SimulationPreview {
            buy_price: position.buy_price,
            simulated_current_price: price,
            expected_percent_change: round2(percent_change(position.buy_price, price)),
        };
        let position = position.clone();
        self.persist_position(&position).await;
        drop(ledger);

        self.events.emit_lossy(SimEvent::SimulationSet {
            transaction_id,
            simulated_current_price: price,
            timestamp: Utc::now(),
        });
        Ok(preview)
    }

    /// Return a position to live market data
    pub async fn clear_simulated_price(&self, transaction_id: u64) -> Result<()> {
        let mut ledger = self.ledger.write().await;
        let position = ledger
            .positions
            .get_mut(&transaction_id)
            .ok_or_else(transaction_not_found)?;
        position.simulated_current_price = None;
        let position = position.clone();
        self.persist_position(&position).await;
        drop(ledger);

        self.events.emit_lossy(SimEvent::SimulationCleared {
            transaction_id,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Mark an active position to `price` and fire an alert if warranted
    ///
    /// `simulated` says the price was read from the position's override.
    /// An override price is dropped if the override has since changed or
    /// been cleared; a live price is dropped while an override is set.
    /// Returns `None` for unknown, inactive or stale updates.
    pub async fn apply_price(
        &self,
        transaction_id: u64,
        price: f64,
        simulated: bool,
        threshold_percent: f64,
    ) -> Option<PriceUpdate> {
        let mut ledger = self.ledger.write().await;
        let position = ledger.positions.get_mut(&transaction_id)?;
        if !position.is_active() {
            return None;
        }
        // The override may have been set, changed or cleared mid-scan
        let stale = if simulated {
            position.simulated_current_price != Some(price)
        } else {
            position.simulated_current_price.is_some()
        };
        if stale {
            return None;
        }

        let change = percent_change(position.buy_price, price);
        position.current_price = price;
        position.percent_change = round2(change);

        let now = Utc::now();
        let alert = match classify_movement(change, threshold_percent) {
            Some(kind) if !position.alert_sent => {
                position.alert_sent = true;
                position.alert_type = Some(kind);
                position.alert_triggered_at = Some(now);
                Some(AlertRecord {
                    alert_id: Uuid::new_v4(),
                    timestamp: now,
                    alert_type: kind,
                    percent_change: round2(change),
                    current_price: price,
                    buy_price: position.buy_price,
                })
            }
            _ => None,
        };

        let position = position.clone();
        if let Some(alert) = &alert {
            ledger
                .alert_history
                .entry(transaction_id)
                .or_default()
                .push(alert.clone());
            self.persist_alert(transaction_id, alert).await;
        }
        self.persist_position(&position).await;
        drop(ledger);

        self.events.emit_lossy(SimEvent::PositionRepriced {
            transaction_id,
            symbol: position.symbol.clone(),
            current_price: price,
            percent_change: position.percent_change,
            simulated,
            timestamp: now,
        });
        if let Some(alert) = &alert {
            self.events.emit_lossy(SimEvent::AlertTriggered {
                alert_id: alert.alert_id,
                transaction_id,
                symbol: position.symbol.clone(),
                alert_type: alert.alert_type,
                percent_change: alert.percent_change,
                current_price: alert.current_price,
                buy_price: alert.buy_price,
                timestamp: alert.timestamp,
            });
        }

        Some(PriceUpdate { position, alert })
    }
}

fn transaction_not_found() -> Error {
    Error::NotFound("Transaction not found".to_string())
}
