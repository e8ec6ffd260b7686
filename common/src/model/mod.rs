//! Domain models for the quote bridge

pub mod quote;
pub mod stream;
pub mod symbol;
pub mod tick;
