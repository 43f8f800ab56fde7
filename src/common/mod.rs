//! Shared infrastructure: the root error type.

pub mod error;

pub use error::{BridgeError, Result};
