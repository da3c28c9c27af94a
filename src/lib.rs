//! Rates dashboard ingestion: polls a market-data provider for treasury
//! spots, fed-fund futures, FOMC implied rates and one volatility matrix,
//! appends every observation to per-instrument CSV logs and keeps the
//! latest value per instrument in a shared in-memory cache for display.

pub mod append_log;
pub mod cache;
pub mod config;
pub mod error;
pub mod poller;
pub mod provider;
pub mod registry;
pub mod stats;
pub mod types;
pub mod view;
