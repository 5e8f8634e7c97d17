//! Background workers

pub mod pos_poller;

pub use pos_poller::PosPoller;
