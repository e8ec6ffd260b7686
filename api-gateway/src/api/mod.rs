//! REST API handlers

pub mod history;
pub mod status;
