pub mod api;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod cycle_stats;
pub mod error;
pub mod eth;
pub mod models;
pub mod numeric;
pub mod observer;
pub mod stats;
pub mod window;
