//! Signal module
//!
//! Directional intents emitted by strategies

mod types;

pub use types::{Signal, SignalDirection, SignalError};
