//! # Light Client Test Suite
//!
//! End-to-end scenarios running [`lc_light_client::LightClientService`]
//! against the simulated [`lc_light_client::InMemoryLedger`].
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── scenarios/
//!     ├── accounts.rs    # Create, transfer, verified reads
//!     ├── polling.rs     # Commit timeout and cancellation
//!     └── tampering.rs   # Lying node responses
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lc-tests
//! cargo test -p lc-tests scenarios::tampering::
//! ```

pub mod scenarios;
