//! # Application Module
//!
//! Query verification, transaction submission and the service tying them
//! to a node.

pub mod query;
pub mod service;
pub mod submission;

pub use query::{verify_account, verify_block};
pub use service::LightClientService;
pub use submission::{await_commitment, build_transaction, submit};
