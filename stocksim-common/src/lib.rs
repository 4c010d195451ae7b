//! # StockSim Common Library
//!
//! Shared code for the StockSim service and launcher:
//! - Error type
//! - Configuration loading (TOML file + resolution order)
//! - Event types and EventBus
//! - SSE helpers
//! - SQLite initialization
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, SimEvent};
