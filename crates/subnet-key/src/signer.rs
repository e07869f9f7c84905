//! Transaction signing over a [`KeyRing`].
//!
//! Every signature group (one per input, plus subnet authorization) gets one
//! [`Credential`] holding exactly `sigs_per_input` signatures over the
//! unsigned transaction's signing hash. Credentials are only written once
//! every group has been signed, so a failure leaves `tx` untouched.

use subnet_core::crypto::{KeyPair, PublicKey, Signature};
use subnet_core::error::SigningError;
use subnet_core::ids::ShortId;
use subnet_core::types::{Credential, Tx};
use tracing::debug;

use crate::key::KeyRing;

pub struct TxSigner;

impl TxSigner {
    pub fn sign<R: KeyRing + ?Sized>(
        tx: &mut Tx,
        sigs_per_input: usize,
        ring: &R,
    ) -> Result<(), SigningError> {
        let payload = tx.unsigned.signing_hash();
        let input_count = tx.unsigned.inputs().len();

        let mut credentials = Vec::with_capacity(input_count + 1);
        for (index, slots) in tx.unsigned.signature_groups().into_iter().enumerate() {
            let keys = Self::slot_keys(tx, index, slots, ring)?;
            let signatures: Vec<Signature> = match (keys.len(), sigs_per_input) {
                (_, 0) => {
                    return Err(SigningError::SignatureCount {
                        index,
                        required: 0,
                        slots: keys.len(),
                    });
                }
                (n, required) if n == required => {
                    keys.iter().map(|kp| kp.sign(payload.as_bytes())).collect()
                }
                // Sole signer: its signature fills every required slot.
                (1, required) => vec![keys[0].sign(payload.as_bytes()); required],
                (n, required) => {
                    return Err(SigningError::SignatureCount {
                        index,
                        required,
                        slots: n,
                    });
                }
            };
            credentials.push(Credential { signatures });
        }

        debug!(groups = credentials.len(), sigs_per_input, "signed transaction");
        tx.credentials = credentials;
        Ok(())
    }

    /// Resolve each slot address of group `index` to a held keypair.
    fn slot_keys<'r, R: KeyRing + ?Sized>(
        tx: &Tx,
        index: usize,
        slots: &[ShortId],
        ring: &'r R,
    ) -> Result<Vec<&'r KeyPair>, SigningError> {
        if slots.is_empty() || !slots.iter().any(|a| ring.holds(a)) {
            let utxo = tx
                .unsigned
                .inputs()
                .get(index)
                .map(|i| i.utxo_id.to_string())
                .unwrap_or_else(|| "subnet authorization".to_string());
            return Err(SigningError::UnknownInput { index, utxo });
        }
        slots
            .iter()
            .map(|addr| {
                ring.keypair(addr).ok_or_else(|| SigningError::ForeignSlot {
                    index,
                    address: addr.to_string(),
                })
            })
            .collect()
    }

    /// Check every credential against the signing hash and slot owners.
    pub fn verify(tx: &Tx, public_keys: &[PublicKey]) -> bool {
        let payload = tx.unsigned.signing_hash();
        let groups = tx.unsigned.signature_groups();
        if groups.len() != tx.credentials.len() {
            return false;
        }
        groups.iter().zip(&tx.credentials).all(|(slots, cred)| {
            !cred.signatures.is_empty()
                && cred.signatures.iter().enumerate().all(|(j, sig)| {
                    let Some(&addr) = slots.get(j).or(slots.last()) else {
                        return false;
                    };
                    public_keys
                        .iter()
                        .find(|pk| pk.address() == addr)
                        .is_some_and(|pk| pk.verify(payload.as_bytes(), sig).is_ok())
                })
        })
    }
}
