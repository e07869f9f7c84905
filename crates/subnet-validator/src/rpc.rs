//! JSON-RPC [`ChainClient`] for a node's info and platform-chain APIs.
//!
//! Amounts and counts come back as decimal strings; both strings and plain
//! numbers are accepted. UTXOs are fetched page by page, following
//! `endIndex` until a short page. Issued transactions are polled with
//! `platform.getTxStatus` until committed or rejected.

use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::Value;
use subnet_core::address::Address;
use subnet_core::constants::TX_STATUS_POLL_MILLIS;
use subnet_core::error::ChainError;
use subnet_core::ids::{Id, ShortId};
use subnet_core::types::{OutputOwners, Tx, Utxo};
use subnet_key::Key;
use tracing::{debug, trace};

use crate::traits::{ChainClient, NetworkInfo};

const INFO_PATH: &str = "/ext/info";
const PLATFORM_PATH: &str = "/ext/bc/P";
const UTXO_PAGE_LIMIT: u64 = 1024;

pub struct RpcChainClient {
    info: HttpClient,
    platform: HttpClient,
    network: NetworkInfo,
    poll_interval: Duration,
    utxo_page_limit: u64,
}

impl RpcChainClient {
    /// Connect to the node at `uri` and fetch its network parameters.
    pub async fn connect(uri: &str, request_timeout: Duration) -> Result<Self, ChainError> {
        let base = uri.trim_end_matches('/');
        let build = |path: &str| {
            HttpClientBuilder::default()
                .request_timeout(request_timeout)
                .build(format!("{base}{path}"))
                .map_err(|e| ChainError::Transport(format!("{base}{path}: {e}")))
        };
        let info = build(INFO_PATH)?;
        let platform = build(PLATFORM_PATH)?;

        let resp = call(&info, "info.getNetworkID", ObjectParams::new()).await?;
        let network_id = u32::try_from(field_u64(&resp, "networkID")?)
            .map_err(|e| ChainError::Decode(format!("networkID: {e}")))?;
        let resp = call(&platform, "platform.getStakingAssetID", ObjectParams::new()).await?;
        let asset_id = field_str(&resp, "assetID")?
            .parse()
            .map_err(|e| ChainError::Decode(format!("assetID: {e}")))?;

        debug!(uri = base, network_id, %asset_id, "connected");
        Ok(Self {
            info,
            platform,
            network: NetworkInfo {
                network_id,
                // The platform chain's blockchain ID is all zeros.
                blockchain_id: Id::EMPTY,
                asset_id,
            },
            poll_interval: Duration::from_millis(TX_STATUS_POLL_MILLIS),
            utxo_page_limit: UTXO_PAGE_LIMIT,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_utxo_page_limit(mut self, limit: u64) -> Self {
        self.utxo_page_limit = limit.max(1);
        self
    }

    fn p_address(&self, addr: ShortId) -> String {
        Address::for_network(self.network.network_id, addr).to_string()
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn network_info(&self) -> Result<NetworkInfo, ChainError> {
        Ok(self.network)
    }

    async fn tx_fee(&self) -> Result<u64, ChainError> {
        let resp = call(&self.info, "info.getTxFee", ObjectParams::new()).await?;
        field_u64(&resp, "txFee")
    }

    async fn balance(&self, key: &dyn Key) -> Result<u64, ChainError> {
        let mut params = ObjectParams::new();
        insert(&mut params, "addresses", vec![self.p_address(key.address())])?;
        let resp = call(&self.platform, "platform.getBalance", params).await?;
        field_u64(&resp, "balance")
    }

    async fn utxos(&self, address: ShortId) -> Result<Vec<Utxo>, ChainError> {
        let mut utxos = Vec::new();
        let mut start_index: Option<Value> = None;
        loop {
            let mut params = ObjectParams::new();
            insert(&mut params, "addresses", vec![self.p_address(address)])?;
            insert(&mut params, "limit", self.utxo_page_limit)?;
            insert(&mut params, "encoding", "json")?;
            if let Some(index) = &start_index {
                insert(&mut params, "startIndex", index)?;
            }
            let resp = call(&self.platform, "platform.getUTXOs", params).await?;
            let page: Vec<Utxo> = resp
                .get("utxos")
                .cloned()
                .ok_or_else(|| ChainError::Decode("missing field utxos".into()))
                .and_then(|v| {
                    serde_json::from_value(v).map_err(|e| ChainError::Decode(format!("utxos: {e}")))
                })?;
            let fetched = page.len() as u64;
            utxos.extend(page);
            if fetched < self.utxo_page_limit {
                break;
            }
            start_index = Some(
                resp.get("endIndex")
                    .cloned()
                    .ok_or_else(|| ChainError::Decode("missing field endIndex".into()))?,
            );
        }
        trace!(count = utxos.len(), "fetched utxos");
        Ok(utxos)
    }

    async fn subnet_owners(&self, subnet_id: Id) -> Result<OutputOwners, ChainError> {
        let mut params = ObjectParams::new();
        insert(&mut params, "ids", vec![subnet_id.to_string()])?;
        let resp = call(&self.platform, "platform.getSubnets", params).await?;
        let subnet = resp
            .get("subnets")
            .and_then(Value::as_array)
            .and_then(|subnets| subnets.first())
            .ok_or_else(|| ChainError::Decode(format!("unknown subnet {subnet_id}")))?;
        parse_owners(subnet)
    }

    async fn issue_tx(&self, tx: &Tx) -> Result<Id, ChainError> {
        let mut params = ObjectParams::new();
        insert(&mut params, "tx", format!("0x{}", hex::encode(tx.to_bytes())))?;
        insert(&mut params, "encoding", "hex")?;
        let resp = call(&self.platform, "platform.issueTx", params).await?;
        let tx_id: Id = field_str(&resp, "txID")?
            .parse()
            .map_err(|e| ChainError::Decode(format!("txID: {e}")))?;
        if tx_id != tx.id() {
            debug!(%tx_id, local = %tx.id(), "node reported a different tx id");
        }
        Ok(tx_id)
    }

    /// Poll until `tx_id` is committed, or fail if the chain drops it.
    async fn wait_committed(&self, tx_id: Id) -> Result<(), ChainError> {
        loop {
            let mut params = ObjectParams::new();
            insert(&mut params, "txID", tx_id.to_string())?;
            let resp = call(&self.platform, "platform.getTxStatus", params).await?;
            let status = field_str(&resp, "status")?;
            trace!(%tx_id, status, "tx status");
            match status {
                "Committed" => return Ok(()),
                "Processing" | "Unknown" => tokio::time::sleep(self.poll_interval).await,
                other => {
                    let reason = resp
                        .get("reason")
                        .and_then(Value::as_str)
                        .unwrap_or(other)
                        .to_string();
                    return Err(ChainError::Rejected {
                        tx_id: tx_id.to_string(),
                        reason,
                    });
                }
            }
        }
    }
}

async fn call(client: &HttpClient, method: &str, params: ObjectParams) -> Result<Value, ChainError> {
    client
        .request(method, params)
        .await
        .map_err(|e| ChainError::Transport(format!("{method}: {e}")))
}

fn insert<T: serde::Serialize>(
    params: &mut ObjectParams,
    name: &str,
    value: T,
) -> Result<(), ChainError> {
    params
        .insert(name, value)
        .map_err(|e| ChainError::Transport(format!("encode {name}: {e}")))
}

fn field_str<'v>(v: &'v Value, key: &str) -> Result<&'v str, ChainError> {
    v.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::Decode(format!("missing string field {key}")))
}

fn field_u64(v: &Value, key: &str) -> Result<u64, ChainError> {
    match v.get(key) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e| ChainError::Decode(format!("{key}: {e}"))),
        Some(n) => n
            .as_u64()
            .ok_or_else(|| ChainError::Decode(format!("{key} is not a u64"))),
        None => Err(ChainError::Decode(format!("missing field {key}"))),
    }
}

/// `{"controlKeys": ["P-..."], "threshold": "1"}` into owners.
fn parse_owners(subnet: &Value) -> Result<OutputOwners, ChainError> {
    let addrs = subnet
        .get("controlKeys")
        .and_then(Value::as_array)
        .ok_or_else(|| ChainError::Decode("missing field controlKeys".into()))?
        .iter()
        .map(|k| {
            let s = k
                .as_str()
                .ok_or_else(|| ChainError::Decode("control key is not a string".into()))?;
            Address::parse_platform(s)
                .map(|a| a.short_id())
                .map_err(|e| ChainError::Decode(format!("control key {s}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let threshold = u32::try_from(field_u64(subnet, "threshold")?)
        .map_err(|e| ChainError::Decode(format!("threshold: {e}")))?;
    Ok(OutputOwners {
        locktime: 0,
        threshold,
        addrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use subnet_core::constants::LOCAL_ID;

    #[test]
    fn u64_from_string_or_number() {
        let v = json!({"a": "1000000", "b": 42, "c": "x", "d": -1});
        assert_eq!(field_u64(&v, "a").unwrap(), 1_000_000);
        assert_eq!(field_u64(&v, "b").unwrap(), 42);
        assert!(matches!(field_u64(&v, "c"), Err(ChainError::Decode(_))));
        assert!(matches!(field_u64(&v, "d"), Err(ChainError::Decode(_))));
        assert!(matches!(field_u64(&v, "e"), Err(ChainError::Decode(_))));
    }

    #[test]
    fn str_field() {
        let v = json!({"status": "Committed", "n": 1});
        assert_eq!(field_str(&v, "status").unwrap(), "Committed");
        assert!(field_str(&v, "n").is_err());
    }

    #[test]
    fn owners_from_subnet_json() {
        let a = ShortId([1; 20]);
        let b = ShortId([2; 20]);
        let v = json!({
            "id": Id([4; 32]).to_string(),
            "controlKeys": [
                Address::for_network(LOCAL_ID, a).to_string(),
                Address::for_network(LOCAL_ID, b).to_string(),
            ],
            "threshold": "2",
        });
        let owners = parse_owners(&v).unwrap();
        assert_eq!(owners.addrs, vec![a, b]);
        assert_eq!(owners.threshold, 2);
        assert_eq!(owners.locktime, 0);
    }

    #[test]
    fn owners_with_bad_key() {
        let v = json!({"controlKeys": ["X-local1qqqq"], "threshold": "1"});
        assert!(matches!(parse_owners(&v), Err(ChainError::Decode(_))));
    }
}
