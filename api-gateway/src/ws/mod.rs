//! WebSocket subscriber transport

pub mod handler;
pub mod message;
