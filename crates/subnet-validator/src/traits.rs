//! Chain access seam used by the workflow.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use subnet_core::error::ChainError;
use subnet_core::ids::{Id, ShortId};
use subnet_core::types::{OutputOwners, SubnetValidator, Tx, Utxo};
use subnet_key::Key;
use tracing::debug;

use crate::builder::{self, StakeContext};

/// Network parameters every platform-chain transaction embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub network_id: u32,
    pub blockchain_id: Id,
    /// Asset paying fees.
    pub asset_id: Id,
}

/// A transaction accepted by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub tx_id: Id,
    /// Wall time from building the transaction until the chain accepted it.
    pub elapsed: Duration,
}

/// Platform-chain client.
///
/// Implementations only need the query and issue primitives; the default
/// [`add_subnet_validator`](ChainClient::add_subnet_validator) builds, signs
/// and issues the staking transaction from them. Callers bound every call
/// with their own deadline, so no method retries on its own.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn network_info(&self) -> Result<NetworkInfo, ChainError>;

    /// Flat fee charged per transaction.
    async fn tx_fee(&self) -> Result<u64, ChainError>;

    /// Spendable balance of `key`'s address.
    async fn balance(&self, key: &dyn Key) -> Result<u64, ChainError>;

    async fn utxos(&self, address: ShortId) -> Result<Vec<Utxo>, ChainError>;

    /// Control keys of `subnet_id`, which must authorize validator changes.
    async fn subnet_owners(&self, subnet_id: Id) -> Result<OutputOwners, ChainError>;

    /// Issue `tx` and resolve once the node has accepted it for processing.
    async fn issue_tx(&self, tx: &Tx) -> Result<Id, ChainError>;

    /// Resolve once `tx_id` is committed. Clients whose `issue_tx` already
    /// waits for commitment keep the default.
    async fn wait_committed(&self, _tx_id: Id) -> Result<(), ChainError> {
        Ok(())
    }

    /// Build and sign the transaction adding `validator.node_id` to the
    /// validator set of `validator.subnet_id`, paying the fee from `key`'s
    /// UTXOs and returning change to `change_addr`.
    ///
    /// Local selection and signing failures come back as
    /// [`ChainError::Selection`] and [`ChainError::Signing`].
    async fn prepare_add_subnet_validator(
        &self,
        key: &dyn Key,
        validator: &SubnetValidator,
        change_addr: ShortId,
    ) -> Result<Tx, ChainError> {
        let info = self.network_info().await?;
        let tx_fee = self.tx_fee().await?;
        let utxos = self.utxos(key.address()).await?;
        let owners = self.subnet_owners(validator.subnet_id).await?;

        let ctx = StakeContext {
            network_id: info.network_id,
            blockchain_id: info.blockchain_id,
            asset_id: info.asset_id,
            tx_fee,
            time: unix_now(),
        };
        builder::build_add_subnet_validator_tx(
            key,
            &utxos,
            &owners,
            validator.clone(),
            change_addr,
            &ctx,
        )
    }

    /// Prepare, issue and wait for the add-subnet-validator transaction.
    async fn add_subnet_validator(
        &self,
        key: &dyn Key,
        validator: &SubnetValidator,
        change_addr: ShortId,
    ) -> Result<Submitted, ChainError> {
        let started = Instant::now();
        let tx = self
            .prepare_add_subnet_validator(key, validator, change_addr)
            .await?;
        let tx_id = self.issue_tx(&tx).await?;
        self.wait_committed(tx_id).await?;
        debug!(%tx_id, node_id = %validator.node_id, "add subnet validator committed");
        Ok(Submitted {
            tx_id,
            elapsed: started.elapsed(),
        })
    }
}

/// Current unix time in seconds, for lock-time checks.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
