//! # Light Client Configuration
//!
//! Everything the codec and the verification pipeline need to know about
//! the target network is passed in here at construction time.

use crate::domain::{LightClientError, TransactionBody};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::env;
use std::time::Duration;

/// Default service id of the account service.
pub const DEFAULT_SERVICE_ID: u16 = 128;
/// Default number of commitment polls.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default delay between commitment polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Message type of a transaction body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Account creation.
    CreateAccount,
    /// Funds transfer.
    Transfer,
    /// Funds issuance.
    Issue,
}

/// Schema table: which `(service_id, message_id)` pair carries which body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSchema {
    /// Service id of the account service.
    pub service_id: u16,
    /// Service name used in query URLs.
    pub service_name: String,
    /// Message id of account creation.
    pub create_account_message_id: u16,
    /// Message id of transfers.
    pub transfer_message_id: u16,
    /// Message id of issuance.
    pub issue_message_id: u16,
}

impl Default for TransactionSchema {
    fn default() -> Self {
        Self {
            service_id: DEFAULT_SERVICE_ID,
            service_name: "cryptocurrency".to_string(),
            create_account_message_id: 2,
            transfer_message_id: 0,
            issue_message_id: 1,
        }
    }
}

impl TransactionSchema {
    /// Message id for a body.
    pub fn message_id(&self, body: &TransactionBody) -> u16 {
        match body {
            TransactionBody::CreateAccount(_) => self.create_account_message_id,
            TransactionBody::Transfer(_) => self.transfer_message_id,
            TransactionBody::Issue(_) => self.issue_message_id,
        }
    }

    /// Look up the body kind for a message header.
    pub fn kind(&self, service_id: u16, message_id: u16) -> Option<MessageKind> {
        if service_id != self.service_id {
            return None;
        }
        [
            (self.create_account_message_id, MessageKind::CreateAccount),
            (self.transfer_message_id, MessageKind::Transfer),
            (self.issue_message_id, MessageKind::Issue),
        ]
        .into_iter()
        .find_map(|(id, kind)| (id == message_id).then_some(kind))
    }

    fn message_ids(&self) -> [u16; 3] {
        [
            self.create_account_message_id,
            self.transfer_message_id,
            self.issue_message_id,
        ]
    }
}

/// Light client configuration.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightClientConfig {
    /// Network id written into transaction headers.
    pub network_id: u8,
    /// Protocol version written into transaction headers.
    pub protocol_version: u8,
    /// Transaction schema table.
    pub schema: TransactionSchema,
    /// Index of the account table within the service.
    pub table_index: u16,
    /// Maximum commitment polls.
    pub max_attempts: u32,
    /// Fixed delay before each retry.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
    /// Base URL of the node.
    pub node_url: String,
    /// HTTP request timeout.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_timeout: Duration,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self {
            network_id: 0,
            protocol_version: 0,
            schema: TransactionSchema::default(),
            table_index: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            node_url: "http://127.0.0.1:8080".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl LightClientConfig {
    /// Create a config for testing (short polling).
    pub fn for_testing() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            request_timeout: Duration::from_secs(1),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `LC_NODE_URL`: node base URL
    /// - `LC_MAX_ATTEMPTS`: commitment polls (default: 10)
    /// - `LC_POLL_INTERVAL_MS`: delay between polls (default: 500)
    /// - `LC_SERVICE_ID`: account service id (default: 128)
    pub fn from_env() -> Result<Self, LightClientError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("LC_NODE_URL") {
            config.node_url = url;
        }
        if let Some(attempts) = parse_var("LC_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }
        if let Some(ms) = parse_var::<u64>("LC_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(service_id) = parse_var("LC_SERVICE_ID")? {
            config.schema.service_id = service_id;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), LightClientError> {
        if self.max_attempts == 0 {
            return Err(LightClientError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let ids = self.schema.message_ids();
        for (i, id) in ids.iter().enumerate() {
            if ids[i + 1..].contains(id) {
                return Err(LightClientError::InvalidConfig(format!(
                    "message id {id} assigned to two transaction types"
                )));
            }
        }
        Ok(())
    }

    /// Upper bound on the wall-clock time of one commitment poll.
    pub fn max_poll_duration(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, LightClientError> {
    match env::var(key) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| LightClientError::InvalidConfig(format!("{key}={val} is not valid"))),
        Err(_) => Ok(None),
    }
}
