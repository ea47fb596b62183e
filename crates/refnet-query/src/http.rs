// HTTP gateway backend.
//
// Talks JSON to a read-only ledger gateway:
//   GET {base}/nodes/{id}                  -> raw node payload
//   GET {base}/nodes/by-address/{address}  -> raw node payload
//   GET {base}/nodes/{address}/referrals   -> [address, ...]
//   GET {base}/nodes/{address}/active      -> bool
//   GET {base}/nodes/{id}/standing         -> { "maxLevel": .., "rank": .. }
//
// Failure mapping: 404 is "absent"; connection failures mean the gateway cannot be
// reached at all (`Unavailable`); timeouts, other statuses and undecodable bodies are
// `Transient`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use refnet_core::{Address, LookupError, NodeId, NodeRecord, RawNodeRecord, Standing};

use crate::NodeQuery;

#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: Client,
    base_url: String,
}

impl HttpLedger {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LookupError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(classify)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| LookupError::Transient(format!("undecodable body from {}: {}", url, e))),
            status => Err(LookupError::Transient(format!("{} returned {}", url, status))),
        }
    }

    async fn get_node(&self, path: &str) -> Result<Option<NodeRecord>, LookupError> {
        match self.get_json::<RawNodeRecord>(path).await? {
            Some(raw) => Ok(raw.into_record()?),
            None => Ok(None),
        }
    }
}

fn classify(err: reqwest::Error) -> LookupError {
    if err.is_connect() {
        LookupError::Unavailable(err.to_string())
    } else {
        LookupError::Transient(err.to_string())
    }
}

#[async_trait]
impl NodeQuery for HttpLedger {
    async fn get_node_by_id(&self, id: NodeId) -> Result<Option<NodeRecord>, LookupError> {
        self.get_node(&format!("/nodes/{}", id)).await
    }

    async fn get_node_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<NodeRecord>, LookupError> {
        self.get_node(&format!("/nodes/by-address/{}", address)).await
    }

    async fn get_direct_referrals(&self, address: &Address) -> Result<Vec<Address>, LookupError> {
        let raw = self
            .get_json::<Vec<String>>(&format!("/nodes/{}/referrals", address))
            .await?
            .unwrap_or_default();
        raw.iter()
            .map(|a| Address::parse(a).map_err(LookupError::from))
            .collect()
    }

    async fn is_active(&self, address: &Address) -> Result<bool, LookupError> {
        Ok(self
            .get_json::<bool>(&format!("/nodes/{}/active", address))
            .await?
            .unwrap_or(false))
    }

    async fn get_standing(&self, id: NodeId) -> Result<Option<Standing>, LookupError> {
        self.get_json::<Standing>(&format!("/nodes/{}/standing", id)).await
    }
}
