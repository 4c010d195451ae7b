//! Real-time market monitor
//!
//! Re-prices every active position on a fixed interval and raises a
//! movement alert once a position crosses the threshold in either direction.
//! A scan that overruns the interval delays the next one; scans never overlap.

use crate::market::Market;
use crate::portfolio::{AlertRecord, Portfolio, Position};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stocksim_common::events::SimEvent;
use stocksim_common::time::{clock_label, datetime_label, now};
use stocksim_common::EventBus;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Monitor timing and alert threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub interval: Duration,
    /// Absolute percent move that triggers an alert
    pub threshold_percent: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(stocksim_common::config::DEFAULT_MONITOR_INTERVAL_SECS),
            threshold_percent: stocksim_common::config::DEFAULT_ALERT_THRESHOLD_PERCENT,
        }
    }
}

/// Shared "is the monitor loop alive" flag
#[derive(Debug, Clone, Default)]
pub struct MonitorStatus {
    running: Arc<AtomicBool>,
}

impl MonitorStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

/// Counts from one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub positions_checked: usize,
    pub alerts_triggered: usize,
}

pub struct MarketMonitor {
    portfolio: Arc<Portfolio>,
    market: Arc<Market>,
    events: EventBus,
    settings: MonitorSettings,
    status: MonitorStatus,
}

impl MarketMonitor {
    pub fn new(
        portfolio: Arc<Portfolio>,
        market: Arc<Market>,
        events: EventBus,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            portfolio,
            market,
            events,
            settings,
            status: MonitorStatus::new(),
        }
    }

    /// Handle for reporting whether the loop is running
    pub fn status(&self) -> MonitorStatus {
        self.status.clone()
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    /// One pass over all active positions
    pub async fn scan_once(&self) -> ScanReport {
        let active = self.portfolio.active_positions().await;
        let mut report = ScanReport::default();
        if active.is_empty() {
            return report;
        }

        info!("[{}] Real-time market scan ({} positions)", clock_label(now()), active.len());

        for position in active {
            let (price, simulated) = match position.simulated_current_price {
                Some(price) => {
                    info!(
                        transaction_id = position.transaction_id,
                        "[SIMULATED] Using simulated price: ₹{}", price
                    );
                    (Some(price), true)
                }
                None => (self.market.live_price(&position.symbol).await, false),
            };

            let Some(price) = price else {
                debug!(symbol = %position.symbol, "Skipping position, no price");
                continue;
            };

            let Some(update) = self
                .portfolio
                .apply_price(
                    position.transaction_id,
                    price,
                    simulated,
                    self.settings.threshold_percent,
                )
                .await
            else {
                continue;
            };

            report.positions_checked += 1;
            let marked = &update.position;
            info!(
                "{}: Buy @ ₹{} | Current @ ₹{} | Change: {:+.2}%",
                marked.symbol, marked.buy_price, marked.current_price, marked.percent_change
            );

            if let Some(alert) = &update.alert {
                report.alerts_triggered += 1;
                log_alert(marked, alert);
            }
        }

        self.events.emit_lossy(SimEvent::ScanCompleted {
            positions_checked: report.positions_checked,
            alerts_triggered: report.alerts_triggered,
            timestamp: now(),
        });
        report
    }

    /// Run scans until `cancel` fires
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            self.status.set_running(true);
            info!(
                "Real-time market monitoring started (checking every {} seconds, threshold ±{}%)",
                self.settings.interval.as_secs(),
                self.settings.threshold_percent
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.scan_once().await;
                    }
                }
            }

            self.status.set_running(false);
            info!("Market monitor stopped");
        })
    }
}

/// Console banner for a fired alert
fn log_alert(position: &Position, alert: &AlertRecord) {
    let rule = "=".repeat(60);
    warn!("{}", rule);
    warn!("REAL-TIME ALERT TRIGGERED");
    warn!("Stock: {}", position.symbol);
    warn!("   Transaction ID: #{}", position.transaction_id);
    warn!(
        "   Movement: {:+.2}% ({})",
        alert.percent_change,
        alert.alert_type.direction_text()
    );
    warn!("   Purchase Price: ₹{}", alert.buy_price);
    warn!("   Current Price: ₹{}", alert.current_price);
    warn!("   Time: {}", datetime_label(alert.timestamp));
    warn!("{}", rule);
}
