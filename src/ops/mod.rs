// ABOUTME: Caller-facing operation module exports
// ABOUTME: Organizes the boundary surface by category

pub mod connection;
pub mod ingestion;

pub use connection::*;
pub use ingestion::*;
