//! Money/Time Normalizer
//!
//! Pure functions used at the adapter boundary. Nothing downstream of the
//! adapters sees minor units or source-specific timestamp strings.

pub mod money;
pub mod time;
