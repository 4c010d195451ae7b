//! SQLite database access shared by StockSim binaries

pub mod init;

pub use init::{init_database, init_memory_database};
