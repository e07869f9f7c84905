//! Capability traits implemented by every key backing.
//!
//! Callers depend on [`Key`] (usually as `&dyn Key`) and never on a concrete
//! backing. [`KeyRing`] is the lower seam shared by selection and signing: it
//! answers which addresses the backing can sign for.

use subnet_core::crypto::KeyPair;
use subnet_core::error::{SelectionError, SigningError};
use subnet_core::ids::ShortId;
use subnet_core::types::{OutputOwners, Tx, Utxo};

use crate::options::SpendOptions;
use crate::selection::Spend;

pub trait Addresser {
    /// Formatted platform-chain address, e.g. `P-fuji1...`.
    fn p(&self) -> String;

    /// Raw 20-byte address.
    fn address(&self) -> ShortId;
}

pub trait Spender {
    /// Select UTXOs covering `opts.target_amount + opts.fee_deduct` and turn
    /// them into transaction inputs. See [`UtxoSelector`](crate::selection::UtxoSelector).
    fn spends(&self, utxos: &[Utxo], opts: &SpendOptions) -> Result<Spend, SelectionError>;

    /// Attach `sigs_per_input` signatures to every signature group of `tx`.
    fn sign(&self, tx: &mut Tx, sigs_per_input: usize) -> Result<(), SigningError>;

    /// Owner indices this key can fill for `owners`, e.g. a subnet's control
    /// keys. `None` when the threshold cannot be met.
    fn authorize(&self, owners: &OutputOwners) -> Option<Vec<u32>>;
}

/// A holder identity with both capabilities.
pub trait Key: Addresser + Spender + Send + Sync {}

impl<T: Addresser + Spender + Send + Sync> Key for T {}

/// Address-to-keypair lookup.
pub trait KeyRing {
    fn keypair(&self, address: &ShortId) -> Option<&KeyPair>;

    fn holds(&self, address: &ShortId) -> bool {
        self.keypair(address).is_some()
    }
}
