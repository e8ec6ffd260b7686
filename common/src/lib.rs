//! Common types and utilities for the quote bridge
//!
//! This library contains the shared types used across the bridge: the
//! unified error type, instrument scaling profiles, and the quote/tick
//! domain models exchanged between feed producers and subscribers.

pub mod error;
pub mod model;

/// Re-export important types
pub use error::{Error, Result};

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
