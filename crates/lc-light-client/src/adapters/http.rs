//! HTTP Node Adapter
//!
//! Implements the `NodeApi` port over the node's JSON REST API.

use crate::config::LightClientConfig;
use crate::domain::{
    AccountProofResponse, BlockProof, Hash, LightClientError, SubmitAck, TransactionStatus,
    ValidatorSet,
};
use crate::ports::outbound::NodeApi;
use async_trait::async_trait;
use lc_crypto::PublicKey;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// `GET .../configs/actual` response.
#[derive(Debug, Deserialize)]
struct ActualConfigResponse {
    config: ConsensusConfig,
}

#[derive(Debug, Deserialize)]
struct ConsensusConfig {
    validator_keys: Vec<ValidatorKeys>,
}

#[derive(Debug, Deserialize)]
struct ValidatorKeys {
    consensus_key: PublicKey,
}

/// `POST .../transactions` request.
#[derive(Debug, Serialize)]
struct SubmitRequest {
    tx_body: String,
}

/// Node connection over HTTP.
pub struct HttpNode {
    client: Client,
    base_url: String,
    service_name: String,
}

impl HttpNode {
    /// Create a connection to `config.node_url`.
    pub fn new(config: &LightClientConfig) -> Result<Self, LightClientError> {
        Self::with_timeout(
            config.node_url.clone(),
            config.schema.service_name.clone(),
            config.request_timeout,
        )
    }

    /// Create with an explicit base URL and timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        service_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LightClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_name: service_name.into(),
        })
    }

    fn validators_url(&self) -> String {
        format!("{}/api/services/configuration/v1/configs/actual", self.base_url)
    }

    fn account_url(&self, public_key: &PublicKey) -> String {
        format!(
            "{}/api/services/{}/v1/accounts/info/{}",
            self.base_url,
            self.service_name,
            public_key.to_hex()
        )
    }

    fn block_url(&self, height: u64) -> String {
        format!("{}/api/explorer/v1/blocks/{}", self.base_url, height)
    }

    fn transactions_url(&self) -> String {
        format!("{}/api/explorer/v1/transactions", self.base_url)
    }

    fn status_url(&self, tx_hash: &Hash) -> String {
        format!(
            "{}/api/explorer/v1/transactions/{}/status",
            self.base_url,
            hex::encode(tx_hash)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LightClientError> {
        debug!("[lc] GET {}", url);
        let response = self.client.get(url).send().await?;
        decode(url, response).await
    }
}

async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, LightClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(LightClientError::NetworkError(format!(
            "{url} returned HTTP {status}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| LightClientError::NetworkError(format!("{url}: bad JSON: {e}")))
}

#[async_trait]
impl NodeApi for HttpNode {
    async fn validator_set(&self) -> Result<ValidatorSet, LightClientError> {
        let response: ActualConfigResponse = self.get_json(&self.validators_url()).await?;
        validators_from(response)
    }

    async fn account_with_proof(
        &self,
        public_key: PublicKey,
    ) -> Result<AccountProofResponse, LightClientError> {
        self.get_json(&self.account_url(&public_key)).await
    }

    async fn block(&self, height: u64) -> Result<BlockProof, LightClientError> {
        self.get_json(&self.block_url(height)).await
    }

    async fn submit_transaction(&self, tx_bytes: &[u8]) -> Result<SubmitAck, LightClientError> {
        let url = self.transactions_url();
        debug!("[lc] POST {} ({} bytes)", url, tx_bytes.len());
        let response = self
            .client
            .post(&url)
            .json(&SubmitRequest {
                tx_body: hex::encode(tx_bytes),
            })
            .send()
            .await?;
        decode(&url, response).await
    }

    async fn transaction_status(
        &self,
        tx_hash: Hash,
    ) -> Result<TransactionStatus, LightClientError> {
        self.get_json(&self.status_url(&tx_hash)).await
    }
}

fn validators_from(response: ActualConfigResponse) -> Result<ValidatorSet, LightClientError> {
    let keys = response
        .config
        .validator_keys
        .into_iter()
        .map(|v| {
            v.consensus_key.validate()?;
            Ok(v.consensus_key)
        })
        .collect::<Result<Vec<_>, LightClientError>>()?;
    Ok(ValidatorSet::new(keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_crypto::{CryptoError, KeyPair};

    fn node() -> HttpNode {
        HttpNode::with_timeout("http://node:8080/", "cryptocurrency", Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn test_urls() {
        let node = node();
        let pk = KeyPair::from_seed([1; 32]).public_key();
        assert_eq!(
            node.validators_url(),
            "http://node:8080/api/services/configuration/v1/configs/actual"
        );
        assert_eq!(
            node.account_url(&pk),
            format!(
                "http://node:8080/api/services/cryptocurrency/v1/accounts/info/{}",
                pk.to_hex()
            )
        );
        assert_eq!(
            node.block_url(12),
            "http://node:8080/api/explorer/v1/blocks/12"
        );
        assert_eq!(
            node.transactions_url(),
            "http://node:8080/api/explorer/v1/transactions"
        );
        assert_eq!(
            node.status_url(&[0xAB; 32]),
            format!(
                "http://node:8080/api/explorer/v1/transactions/{}/status",
                "ab".repeat(32)
            )
        );
    }

    #[test]
    fn test_validator_config_parsing() {
        let a = KeyPair::from_seed([1; 32]).public_key();
        let b = KeyPair::from_seed([2; 32]).public_key();
        let json = format!(
            r#"{{"config":{{"validator_keys":[
                {{"consensus_key":"{}","service_key":"00"}},
                {{"consensus_key":"{}","service_key":"00"}}
            ]}}}}"#,
            a.to_hex(),
            b.to_hex()
        );
        let response: ActualConfigResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(
            validators_from(response).unwrap(),
            ValidatorSet::new(vec![a, b])
        );
    }

    #[test]
    fn test_off_curve_validator_key_is_rejected() {
        let off_curve = (0u8..=255)
            .map(|low| {
                let mut bytes = [0u8; 32];
                bytes[0] = low;
                PublicKey::new(bytes)
            })
            .find(|key| key.validate().is_err())
            .unwrap();
        let json = format!(
            r#"{{"config":{{"validator_keys":[{{"consensus_key":"{}","service_key":"00"}}]}}}}"#,
            off_curve.to_hex()
        );
        let response: ActualConfigResponse = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            validators_from(response),
            Err(LightClientError::Crypto(CryptoError::InvalidPublicKey))
        ));
    }

    #[test]
    fn test_explorer_block_parsing() {
        // explorer responses carry extra fields next to the block and precommits
        let json = format!(
            r#"{{"block":{{"height":3,"prev_hash":"{h}","tx_hash":"{h}","state_hash":"{h}","tx_count":0}},
                "precommits":[],"txs":[]}}"#,
            h = "00".repeat(32)
        );
        let proof: BlockProof = serde_json::from_str(&json).unwrap();
        assert_eq!(proof.block.height, 3);
        assert!(proof.precommits.is_empty());
    }

    #[test]
    fn test_submit_request_body() {
        let body = serde_json::to_value(SubmitRequest {
            tx_body: hex::encode([1u8, 2, 255]),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "tx_body": "0102ff" }));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_network_error() {
        let node = HttpNode::with_timeout(
            "http://127.0.0.1:1",
            "cryptocurrency",
            Duration::from_millis(200),
        )
        .unwrap();
        let err = node.transaction_status([0; 32]).await.unwrap_err();
        assert!(matches!(err, LightClientError::NetworkError(_)));
    }
}
