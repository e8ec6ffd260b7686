//! Stream mode model

use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Which producer currently feeds the subscriber stream
///
/// Always defined: a failed live connection degrades to `Simulated`,
/// never to an unknown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Ticks originate from the live upstream feed
    Live,
    /// Ticks originate from the local simulator
    Simulated,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Live => write!(f, "live"),
            StreamMode::Simulated => write!(f, "simulated"),
        }
    }
}
