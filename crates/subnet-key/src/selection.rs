//! Deterministic UTXO selection.
//!
//! UTXOs are visited in ascending [`UtxoId`](subnet_core::types::UtxoId)
//! order so the same ledger snapshot always yields the same inputs, total and
//! change. Selection stops as soon as `target + fee` is covered; a zero target
//! sweeps every eligible UTXO. Nothing is mutated: callers building several
//! spends in one pass must drop already-consumed UTXOs themselves.

use subnet_core::error::SelectionError;
use subnet_core::types::{OutputOwners, TransferableInput, Utxo};
use tracing::{debug, trace};

use crate::key::KeyRing;
use crate::options::SpendOptions;

/// Result of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spend {
    /// Sum of the selected UTXO amounts.
    pub total: u64,
    /// Inputs in selection order.
    pub inputs: Vec<TransferableInput>,
    /// `total - target - fee` for a targeted spend. Zero for a sweep, where
    /// everything past the fee is the spent amount.
    pub change: u64,
}

impl Spend {
    /// Value left after the fee: the sweep amount, or `target + change`.
    pub fn after_fee(&self, opts: &SpendOptions) -> u64 {
        self.total.saturating_sub(opts.fee_deduct)
    }
}

/// Pick the owner slots a ring can fill for `owners`: the first `threshold`
/// owner indices it holds. `None` if it cannot reach the threshold.
pub fn authorize<R: KeyRing + ?Sized>(owners: &OutputOwners, ring: &R) -> Option<Vec<u32>> {
    if owners.threshold == 0 {
        return None;
    }
    let indices: Vec<u32> = owners
        .addrs
        .iter()
        .enumerate()
        .filter(|(_, addr)| ring.holds(addr))
        .map(|(i, _)| i as u32)
        .take(owners.threshold as usize)
        .collect();
    (indices.len() == owners.threshold as usize).then_some(indices)
}

pub struct UtxoSelector;

impl UtxoSelector {
    /// Select inputs from `utxos` spendable by `ring` under `opts`.
    ///
    /// Skips UTXOs that are still locked at `opts.time`, belong to another
    /// asset, repeat an already-visited ID, or need signatures the ring does
    /// not hold.
    pub fn select<R: KeyRing + ?Sized>(
        utxos: &[Utxo],
        opts: &SpendOptions,
        ring: &R,
    ) -> Result<Spend, SelectionError> {
        let need = opts.required().ok_or(SelectionError::Overflow)?;

        let mut ordered: Vec<&Utxo> = utxos.iter().collect();
        ordered.sort_by_key(|u| u.utxo_id);
        ordered.dedup_by_key(|u| u.utxo_id);

        let mut total: u64 = 0;
        let mut inputs = Vec::new();
        for utxo in ordered {
            if !opts.is_sweep() && total >= need {
                break;
            }
            if !utxo.owners.is_unlocked_at(opts.time) {
                trace!(utxo = %utxo.utxo_id, locktime = utxo.owners.locktime, "skipping locked UTXO");
                continue;
            }
            if opts.asset_id.is_some_and(|asset| asset != utxo.asset_id) {
                continue;
            }
            let Some(sig_indices) = authorize(&utxo.owners, ring) else {
                trace!(utxo = %utxo.utxo_id, "skipping UTXO not spendable by this key");
                continue;
            };

            total = total
                .checked_add(utxo.amount)
                .ok_or(SelectionError::Overflow)?;
            let signers = sig_indices
                .iter()
                .map(|&i| utxo.owners.addrs[i as usize])
                .collect();
            inputs.push(TransferableInput {
                utxo_id: utxo.utxo_id,
                asset_id: utxo.asset_id,
                amount: utxo.amount,
                sig_indices,
                signers,
            });
        }

        if total < need {
            return Err(SelectionError::InsufficientFunds { have: total, need });
        }
        if inputs.is_empty() {
            return Err(SelectionError::NoEligibleUtxos);
        }

        let change = if opts.is_sweep() { 0 } else { total - need };
        debug!(inputs = inputs.len(), total, need, change, "selected UTXOs");
        Ok(Spend {
            total,
            inputs,
            change,
        })
    }
}
