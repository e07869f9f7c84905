//! `RpcChainClient` against a fake node serving the info and platform APIs.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use serde_json::{Value, json};
use subnet_core::address::Address;
use subnet_core::constants::LOCAL_ID;
use subnet_core::crypto::KeyPair;
use subnet_core::error::ChainError;
use subnet_core::ids::{Id, NodeId, ShortId};
use subnet_core::types::{OutputOwners, SubnetValidator, Utxo, UtxoId};
use subnet_key::{Addresser, SoftKey};
use subnet_validator::{ChainClient, RpcChainClient};

const ASSET: Id = Id([0xaa; 32]);
const FEE: u64 = 1_000_000;

#[rpc(server)]
trait FakeNode {
    #[method(name = "info.getNetworkID")]
    async fn network_id(&self) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "info.getTxFee")]
    async fn tx_fee(&self) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "platform.getStakingAssetID")]
    async fn staking_asset_id(&self) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "platform.getBalance")]
    async fn balance(&self, addresses: Vec<String>) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "platform.getUTXOs")]
    async fn utxos(
        &self,
        addresses: Vec<String>,
        limit: Option<u64>,
        encoding: Option<String>,
        #[argument(rename = "startIndex")] start_index: Option<Value>,
    ) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "platform.getSubnets")]
    async fn subnets(&self, ids: Vec<String>) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "platform.issueTx")]
    async fn issue_tx(&self, tx: String, encoding: Option<String>) -> Result<Value, ErrorObjectOwned>;

    #[method(name = "platform.getTxStatus")]
    async fn tx_status(
        &self,
        #[argument(rename = "txID")] tx_id: String,
    ) -> Result<Value, ErrorObjectOwned>;
}

#[derive(Default)]
struct State {
    owner: ShortId,
    /// Held UTXOs, each worth `5 * FEE / utxo_count`. Zero means one.
    utxo_count: usize,
    utxo_pages: Mutex<u32>,
    /// Final status reported once polling is past "Processing".
    final_status: &'static str,
    balance_queries: Mutex<Vec<String>>,
    issued: Mutex<Vec<String>>,
    status_polls: Mutex<u32>,
}

struct FakeNodeImpl(Arc<State>);

fn rpc_error(msg: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
}

#[async_trait]
impl FakeNodeServer for FakeNodeImpl {
    async fn network_id(&self) -> Result<Value, ErrorObjectOwned> {
        Ok(json!({ "networkID": LOCAL_ID.to_string() }))
    }

    async fn tx_fee(&self) -> Result<Value, ErrorObjectOwned> {
        Ok(json!({ "txFee": FEE.to_string(), "createSubnetTxFee": "100000000" }))
    }

    async fn staking_asset_id(&self) -> Result<Value, ErrorObjectOwned> {
        Ok(json!({ "assetID": ASSET.to_string() }))
    }

    async fn balance(&self, addresses: Vec<String>) -> Result<Value, ErrorObjectOwned> {
        self.0.balance_queries.lock().unwrap().extend(addresses);
        Ok(json!({ "balance": (5 * FEE).to_string() }))
    }

    async fn utxos(
        &self,
        addresses: Vec<String>,
        limit: Option<u64>,
        encoding: Option<String>,
        start_index: Option<Value>,
    ) -> Result<Value, ErrorObjectOwned> {
        if encoding.as_deref() != Some("json") {
            return Err(rpc_error("unsupported encoding"));
        }
        *self.0.utxo_pages.lock().unwrap() += 1;
        let count = self.0.utxo_count.max(1);
        let start = match start_index {
            Some(index) => {
                let last: usize = index["utxo"]
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| rpc_error("bad startIndex"))?;
                last + 1
            }
            None => 0,
        };
        let limit = limit.unwrap_or(1024) as usize;
        let end = (start + limit).min(count);
        let utxos: Vec<Utxo> = (start..end)
            .map(|i| Utxo {
                utxo_id: UtxoId {
                    tx_id: Id([1; 32]),
                    output_index: i as u32,
                },
                asset_id: ASSET,
                amount: 5 * FEE / count as u64,
                owners: OutputOwners::single(self.0.owner),
            })
            .collect();
        Ok(json!({
            "numFetched": utxos.len().to_string(),
            "utxos": utxos,
            "endIndex": {
                "address": addresses.first().cloned().unwrap_or_default(),
                "utxo": end.saturating_sub(1).to_string(),
            },
        }))
    }

    async fn subnets(&self, ids: Vec<String>) -> Result<Value, ErrorObjectOwned> {
        Ok(json!({
            "subnets": [{
                "id": ids.first().cloned().unwrap_or_default(),
                "controlKeys": [Address::for_network(LOCAL_ID, self.0.owner).to_string()],
                "threshold": "1",
            }]
        }))
    }

    async fn issue_tx(&self, tx: String, encoding: Option<String>) -> Result<Value, ErrorObjectOwned> {
        if encoding.as_deref() != Some("hex") || !tx.starts_with("0x") {
            return Err(rpc_error("bad tx encoding"));
        }
        let bytes = hex::decode(&tx[2..]).map_err(|e| rpc_error(&e.to_string()))?;
        self.0.issued.lock().unwrap().push(tx);
        Ok(json!({ "txID": Id::digest(&bytes).to_string() }))
    }

    async fn tx_status(&self, _tx_id: String) -> Result<Value, ErrorObjectOwned> {
        let mut polls = self.0.status_polls.lock().unwrap();
        *polls += 1;
        if *polls < 3 {
            return Ok(json!({ "status": "Processing" }));
        }
        Ok(json!({ "status": self.0.final_status, "reason": "conflicting validator" }))
    }
}

async fn start(state: Arc<State>) -> (String, ServerHandle) {
    let server = Server::builder().build("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.start(FakeNodeImpl(state).into_rpc());
    (format!("http://{addr}"), handle)
}

fn holder() -> SoftKey {
    SoftKey::new(KeyPair::from_secret_bytes([1; 32]), LOCAL_ID)
}

fn validator() -> SubnetValidator {
    SubnetValidator {
        node_id: NodeId(ShortId([7; 20])),
        start: 1_893_456_000,
        end: 1_897_776_000,
        weight: 1_000,
        subnet_id: Id([4; 32]),
    }
}

async fn client(uri: &str) -> RpcChainClient {
    RpcChainClient::connect(uri, Duration::from_secs(5))
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn queries_network_fee_and_balance() {
    let key = holder();
    let state = Arc::new(State {
        owner: key.address(),
        final_status: "Committed",
        ..State::default()
    });
    let (uri, handle) = start(state.clone()).await;
    let client = client(&uri).await;

    let info = client.network_info().await.unwrap();
    assert_eq!(info.network_id, LOCAL_ID);
    assert_eq!(info.asset_id, ASSET);
    assert_eq!(info.blockchain_id, Id::EMPTY);

    assert_eq!(client.tx_fee().await.unwrap(), FEE);
    assert_eq!(client.balance(&key).await.unwrap(), 5 * FEE);
    assert_eq!(*state.balance_queries.lock().unwrap(), vec![key.p()]);

    let utxos = client.utxos(key.address()).await.unwrap();
    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0].owners.addrs, vec![key.address()]);

    let owners = client.subnet_owners(Id([4; 32])).await.unwrap();
    assert_eq!(owners.addrs, vec![key.address()]);
    assert_eq!(owners.threshold, 1);

    handle.stop().unwrap();
}

#[tokio::test]
async fn utxos_follow_end_index_across_pages() {
    let key = holder();
    let state = Arc::new(State {
        owner: key.address(),
        final_status: "Committed",
        utxo_count: 5,
        ..State::default()
    });
    let (uri, handle) = start(state.clone()).await;
    let client = client(&uri).await.with_utxo_page_limit(2);

    let utxos = client.utxos(key.address()).await.unwrap();
    let indices: Vec<u32> = utxos.iter().map(|u| u.utxo_id.output_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(*state.utxo_pages.lock().unwrap(), 3);

    handle.stop().unwrap();
}

#[tokio::test]
async fn add_subnet_validator_waits_for_commit() {
    let key = holder();
    let state = Arc::new(State {
        owner: key.address(),
        final_status: "Committed",
        ..State::default()
    });
    let (uri, handle) = start(state.clone()).await;
    let client = client(&uri).await;

    let submitted = client
        .add_subnet_validator(&key, &validator(), key.address())
        .await
        .unwrap();

    let issued = state.issued.lock().unwrap().clone();
    assert_eq!(issued.len(), 1);
    let bytes = hex::decode(&issued[0][2..]).unwrap();
    assert_eq!(submitted.tx_id, Id::digest(&bytes));
    assert_eq!(*state.status_polls.lock().unwrap(), 3);

    handle.stop().unwrap();
}

#[tokio::test]
async fn dropped_tx_is_rejected() {
    let key = holder();
    let state = Arc::new(State {
        owner: key.address(),
        final_status: "Dropped",
        ..State::default()
    });
    let (uri, handle) = start(state).await;
    let client = client(&uri).await;

    let err = client
        .add_subnet_validator(&key, &validator(), key.address())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Rejected { reason, .. } if reason == "conflicting validator"
    ));

    handle.stop().unwrap();
}

#[tokio::test]
async fn unreachable_node() {
    let err = RpcChainClient::connect("http://127.0.0.1:1", Duration::from_secs(1))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ChainError::Transport(_)));
}
