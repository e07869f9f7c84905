//! In-memory group of keys acting as one holder.
//!
//! UTXOs owned by several addresses with a threshold above one can only be
//! spent by a backing holding enough of those addresses. The group's own
//! address (used for change and rewards) is its first member's.

use subnet_core::address::Address;
use subnet_core::crypto::KeyPair;
use subnet_core::error::{SelectionError, SigningError};
use subnet_core::ids::ShortId;
use subnet_core::types::{OutputOwners, Tx, Utxo};

use crate::error::KeyError;
use crate::key::{Addresser, KeyRing, Spender};
use crate::options::SpendOptions;
use crate::selection::{self, Spend, UtxoSelector};
use crate::signer::TxSigner;

#[derive(Debug, Clone)]
pub struct MultisigKey {
    keys: Vec<KeyPair>,
    network_id: u32,
}

impl MultisigKey {
    pub fn new(keys: Vec<KeyPair>, network_id: u32) -> Result<Self, KeyError> {
        if keys.is_empty() {
            return Err(KeyError::EmptyGroup);
        }
        Ok(Self { keys, network_id })
    }

    pub fn members(&self) -> &[KeyPair] {
        &self.keys
    }

    pub fn addresses(&self) -> Vec<ShortId> {
        self.keys.iter().map(KeyPair::address).collect()
    }
}

impl KeyRing for MultisigKey {
    fn keypair(&self, address: &ShortId) -> Option<&KeyPair> {
        self.keys.iter().find(|kp| kp.address() == *address)
    }
}

impl Addresser for MultisigKey {
    fn p(&self) -> String {
        Address::for_network(self.network_id, self.address()).to_string()
    }

    fn address(&self) -> ShortId {
        // Non-empty by construction.
        self.keys[0].address()
    }
}

impl Spender for MultisigKey {
    fn spends(&self, utxos: &[Utxo], opts: &SpendOptions) -> Result<Spend, SelectionError> {
        UtxoSelector::select(utxos, opts, self)
    }

    fn sign(&self, tx: &mut Tx, sigs_per_input: usize) -> Result<(), SigningError> {
        TxSigner::sign(tx, sigs_per_input, self)
    }

    fn authorize(&self, owners: &OutputOwners) -> Option<Vec<u32>> {
        selection::authorize(owners, self)
    }
}
