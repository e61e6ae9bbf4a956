//! # Scenarios
//!
//! Shared fixtures for the scenario modules.

pub mod accounts;
pub mod polling;
pub mod tampering;

use std::sync::Arc;

use lc_light_client::{InMemoryLedger, LightClientConfig, LightClientError, LightClientService};
use lc_telemetry::{init_logging, TelemetryConfig};

/// Validators backing the simulated ledger.
pub const VALIDATOR_COUNT: u8 = 4;

/// Service connected to a fresh 4-validator ledger.
pub fn service() -> Result<LightClientService<InMemoryLedger>, LightClientError> {
    service_with(|ledger| ledger)
}

/// Service connected to a fresh ledger customised by `setup`.
pub fn service_with(
    setup: impl FnOnce(InMemoryLedger) -> InMemoryLedger,
) -> Result<LightClientService<InMemoryLedger>, LightClientError> {
    // Only the first scenario in the binary installs the subscriber.
    let _ = init_logging(&TelemetryConfig::for_testing());

    let config = LightClientConfig::for_testing();
    let ledger = setup(InMemoryLedger::new(config.clone(), VALIDATOR_COUNT)?);
    LightClientService::new(config, Arc::new(ledger))
}
