//! Software key: one Ed25519 secret held in memory.

use std::path::Path;

use subnet_core::address::Address;
use subnet_core::crypto::KeyPair;
use subnet_core::error::{SelectionError, SigningError};
use subnet_core::ids::ShortId;
use subnet_core::types::{OutputOwners, Tx, Utxo};
use zeroize::Zeroizing;

use crate::error::KeyError;
use crate::key::{Addresser, KeyRing, Spender};
use crate::options::SpendOptions;
use crate::selection::{self, Spend, UtxoSelector};
use crate::signer::TxSigner;

/// A single-key holder. Spends UTXOs with threshold 1 that list its address.
#[derive(Debug, Clone)]
pub struct SoftKey {
    keypair: KeyPair,
    network_id: u32,
}

impl SoftKey {
    pub fn new(keypair: KeyPair, network_id: u32) -> Self {
        Self {
            keypair,
            network_id,
        }
    }

    pub fn generate(network_id: u32) -> Self {
        Self::new(KeyPair::generate(), network_id)
    }

    /// Load a hex-encoded 32-byte secret from `path`.
    ///
    /// The file contents are zeroized after parsing.
    pub fn load_from_file(path: &Path, network_id: u32) -> Result<Self, KeyError> {
        let contents = Zeroizing::new(
            std::fs::read_to_string(path)
                .map_err(|e| KeyError::Io(format!("{}: {e}", path.display())))?,
        );
        let keypair = KeyPair::from_secret_hex(&contents)?;
        Ok(Self::new(keypair, network_id))
    }

    /// Write the secret as hex to a new file at `path`. Never overwrites.
    pub fn save_to_file(&self, path: &Path) -> Result<(), KeyError> {
        use std::io::Write;

        let io_err = |e: std::io::Error| KeyError::Io(format!("{}: {e}", path.display()));
        let secret = Zeroizing::new(self.keypair.secret_bytes());
        let encoded = Zeroizing::new(hex::encode(&secret[..]));
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(io_err)?;
        file.write_all(encoded.as_bytes()).map_err(io_err)?;
        Ok(())
    }

    /// The same secret, rendering addresses for `network_id`.
    pub fn with_network_id(self, network_id: u32) -> Self {
        Self { network_id, ..self }
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn network_id(&self) -> u32 {
        self.network_id
    }
}

impl KeyRing for SoftKey {
    fn keypair(&self, address: &ShortId) -> Option<&KeyPair> {
        (*address == self.keypair.address()).then_some(&self.keypair)
    }
}

impl Addresser for SoftKey {
    fn p(&self) -> String {
        Address::for_network(self.network_id, self.address()).to_string()
    }

    fn address(&self) -> ShortId {
        self.keypair.address()
    }
}

impl Spender for SoftKey {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use subnet_core::constants::FUJI_ID;
    use subnet_core::ids::Id;
    use subnet_core::types::{BaseTx, OutputOwners, UnsignedTx, UtxoId};

    fn key() -> SoftKey {
        SoftKey::new(KeyPair::from_secret_bytes([3; 32]), FUJI_ID)
    }

    fn utxos(owner: ShortId) -> Vec<Utxo> {
        (1..=3u8)
            .map(|i| Utxo {
                utxo_id: UtxoId {
                    tx_id: Id([i; 32]),
                    output_index: 0,
                },
                asset_id: Id::EMPTY,
                amount: 100,
                owners: OutputOwners::single(owner),
            })
            .collect()
    }

    #[test]
    fn p_address_format() {
        let k = key();
        let p = k.p();
        assert!(p.starts_with("P-fuji1"));
        let parsed: Address = p.parse().unwrap();
        assert_eq!(parsed.short_id(), k.address());
    }

    #[test]
    fn network_rebinding_keeps_the_secret() {
        let k = key();
        let address = k.address();
        let local = k.with_network_id(subnet_core::constants::LOCAL_ID);
        assert_eq!(local.address(), address);
        assert!(local.p().starts_with("P-local1"));
    }

    #[test]
    fn spend_then_sign_through_trait_object() {
        let k = key();
        let dyn_key: &dyn Key = &k;
        let opts = SpendOptions::new().with_target_amount(150).with_fee_deduct(1);
        let spend = dyn_key.spends(&utxos(k.address()), &opts).unwrap();
        assert_eq!(spend.inputs.len(), 2);
        assert_eq!(spend.change, 49);

        let mut tx = Tx::new(UnsignedTx::Base(BaseTx {
            network_id: FUJI_ID,
            inputs: spend.inputs,
            ..BaseTx::default()
        }));
        dyn_key.sign(&mut tx, 1).unwrap();
        assert!(TxSigner::verify(&tx, &[k.keypair().public_key()]));
    }

    #[test]
    fn foreign_utxos_not_spendable() {
        let k = key();
        let err = k
            .spends(&utxos(ShortId([9; 20])), &SpendOptions::new().with_target_amount(1))
            .unwrap_err();
        assert_eq!(err, SelectionError::InsufficientFunds { have: 0, need: 1 });
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.hex");
        std::fs::write(&path, format!("{}\n", "03".repeat(32))).unwrap();
        let loaded = SoftKey::load_from_file(&path, FUJI_ID).unwrap();
        assert_eq!(loaded.address(), key().address());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.hex");
        let key = SoftKey::generate(FUJI_ID);
        key.save_to_file(&path).unwrap();
        let loaded = SoftKey::load_from_file(&path, FUJI_ID).unwrap();
        assert_eq!(loaded.address(), key.address());

        // Existing files are left alone.
        assert!(matches!(key.save_to_file(&path), Err(KeyError::Io(_))));
    }

    #[test]
    fn load_missing_file() {
        let err = SoftKey::load_from_file(Path::new("/nonexistent/key"), FUJI_ID).unwrap_err();
        assert!(matches!(err, KeyError::Io(_)));
    }

    #[test]
    fn load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.hex");
        std::fs::write(&path, "not hex").unwrap();
        assert!(matches!(
            SoftKey::load_from_file(&path, FUJI_ID),
            Err(KeyError::Crypto(_))
        ));
    }
}
