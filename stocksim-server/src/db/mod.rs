//! SQLite journal for positions and alerts
//!
//! The in-memory [`crate::portfolio::Portfolio`] is authoritative while the
//! service runs; these queries write every change through and reload it at
//! startup.

pub mod alerts;
pub mod positions;

pub use alerts::{insert_alert, load_alerts};
pub use positions::{load_positions, upsert_position};
