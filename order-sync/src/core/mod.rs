//! Core service wiring: configuration and shared state

pub mod config;
pub mod state;

pub use config::Config;
pub use state::AppState;
