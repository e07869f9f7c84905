//! Add-subnet-validator transaction construction and signing.

use subnet_core::error::{ChainError, SigningError};
use subnet_core::ids::{Id, ShortId};
use subnet_core::types::{
    BaseTx, OutputOwners, SubnetAuth, SubnetValidator, TransferableOutput, Tx, UnsignedTx, Utxo,
};
use subnet_key::{Key, SpendOptions};
use tracing::debug;

/// Chain parameters and fee for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeContext {
    pub network_id: u32,
    pub blockchain_id: Id,
    pub asset_id: Id,
    pub tx_fee: u64,
    /// Unix seconds used for lock-time checks.
    pub time: u64,
}

/// Build and sign a transaction adding `validator` to its subnet.
///
/// The fee is the only value consumed: every eligible fee-asset UTXO of `key`
/// is spent and everything above the fee comes back as a single change
/// output owned by `change_addr`. The subnet authorization slots are the
/// `subnet_owners` indices `key` can fill.
pub fn build_add_subnet_validator_tx(
    key: &dyn Key,
    utxos: &[Utxo],
    subnet_owners: &OutputOwners,
    validator: SubnetValidator,
    change_addr: ShortId,
    ctx: &StakeContext,
) -> Result<Tx, ChainError> {
    let opts = SpendOptions::new()
        .with_time(ctx.time)
        .with_fee_deduct(ctx.tx_fee)
        .with_asset_id(ctx.asset_id);
    let spend = key.spends(utxos, &opts)?;

    let change = spend.after_fee(&opts);
    let mut outputs = Vec::new();
    if change > 0 {
        outputs.push(TransferableOutput {
            asset_id: ctx.asset_id,
            amount: change,
            owners: OutputOwners::single(change_addr),
        });
    }

    let sig_indices = key
        .authorize(subnet_owners)
        .ok_or_else(|| SigningError::NotSubnetOwner {
            subnet_id: validator.subnet_id.to_string(),
        })?;
    let signers = sig_indices
        .iter()
        .map(|&i| subnet_owners.addrs[i as usize])
        .collect();

    let base = BaseTx {
        network_id: ctx.network_id,
        blockchain_id: ctx.blockchain_id,
        outputs,
        inputs: spend.inputs,
        memo: Vec::new(),
    };
    let mut tx = Tx::new(UnsignedTx::AddSubnetValidator {
        base,
        validator,
        subnet_auth: SubnetAuth {
            sig_indices,
            signers,
        },
    });

    // Widest group sets the count; single-slot groups repeat their signature.
    let sigs_per_input = tx
        .unsigned
        .signature_groups()
        .iter()
        .map(|g| g.len())
        .max()
        .unwrap_or(1);
    key.sign(&mut tx, sigs_per_input)?;

    debug!(
        inputs = tx.unsigned.inputs().len(),
        change,
        fee = ctx.tx_fee,
        "built add subnet validator tx"
    );
    Ok(tx)
}
