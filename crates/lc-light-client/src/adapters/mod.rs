//! # Adapters Module
//!
//! Implementations of the outbound `NodeApi` port.

pub mod http;
pub mod in_memory;

pub use http::HttpNode;
pub use in_memory::{Faults, InMemoryLedger};
