//! UTXOs, transferable inputs/outputs, and platform-chain transactions.
//!
//! All amounts are `u64` base units. The unsigned transaction has one explicit
//! little-endian byte layout ([`UnsignedTx::to_bytes`]); its SHA-256 is the
//! signing payload, and the SHA-256 of the signed bytes is the transaction ID.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::CODEC_VERSION;
use crate::crypto::Signature;
use crate::ids::{Id, NodeId, ShortId};

/// Reference to one output of a previous transaction.
///
/// Ordering is by `tx_id` bytes, then `output_index`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtxoId {
    pub tx_id: Id,
    pub output_index: u32,
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.output_index)
    }
}

/// Spending condition of an output: `threshold` of `addrs` must sign, and not
/// before `locktime` (unix seconds).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct OutputOwners {
    pub locktime: u64,
    pub threshold: u32,
    pub addrs: Vec<ShortId>,
}

impl OutputOwners {
    /// Owned by a single address, spendable immediately.
    pub fn single(addr: ShortId) -> Self {
        Self {
            locktime: 0,
            threshold: 1,
            addrs: vec![addr],
        }
    }

    pub fn is_unlocked_at(&self, time: u64) -> bool {
        self.locktime <= time
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.locktime.to_le_bytes());
        buf.extend_from_slice(&self.threshold.to_le_bytes());
        put_len(buf, self.addrs.len());
        for addr in &self.addrs {
            buf.extend_from_slice(addr.as_bytes());
        }
    }
}

/// An unspent output as reported by the chain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    pub utxo_id: UtxoId,
    pub asset_id: Id,
    pub amount: u64,
    pub owners: OutputOwners,
}

/// Input consuming a [`Utxo`].
///
/// `sig_indices` point into the consumed UTXO's owner list; `signers` holds
/// the owner address at each of those indices so a signer can fill the slots
/// without re-reading the UTXO. `signers` is local metadata and is not part
/// of the encoded transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferableInput {
    pub utxo_id: UtxoId,
    pub asset_id: Id,
    pub amount: u64,
    pub sig_indices: Vec<u32>,
    #[serde(skip)]
    pub signers: Vec<ShortId>,
}

impl TransferableInput {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.utxo_id.tx_id.as_bytes());
        buf.extend_from_slice(&self.utxo_id.output_index.to_le_bytes());
        buf.extend_from_slice(self.asset_id.as_bytes());
        buf.extend_from_slice(&self.amount.to_le_bytes());
        put_len(buf, self.sig_indices.len());
        for idx in &self.sig_indices {
            buf.extend_from_slice(&idx.to_le_bytes());
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferableOutput {
    pub asset_id: Id,
    pub amount: u64,
    pub owners: OutputOwners,
}

impl TransferableOutput {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.asset_id.as_bytes());
        buf.extend_from_slice(&self.amount.to_le_bytes());
        self.owners.encode(buf);
    }
}

/// Fields shared by every platform-chain transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: Id,
    pub outputs: Vec<TransferableOutput>,
    pub inputs: Vec<TransferableInput>,
    pub memo: Vec<u8>,
}

impl BaseTx {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.network_id.to_le_bytes());
        buf.extend_from_slice(self.blockchain_id.as_bytes());
        put_len(buf, self.outputs.len());
        for out in &self.outputs {
            out.encode(buf);
        }
        put_len(buf, self.inputs.len());
        for input in &self.inputs {
            input.encode(buf);
        }
        put_len(buf, self.memo.len());
        buf.extend_from_slice(&self.memo);
    }
}

/// Validator entry for a subnet: `node_id` validates `subnet_id` during
/// `[start, end)` (unix seconds) with stake `weight`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SubnetValidator {
    pub node_id: NodeId,
    pub start: u64,
    pub end: u64,
    pub weight: u64,
    pub subnet_id: Id,
}

/// Authorization by the subnet's control keys. Same slot model as inputs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct SubnetAuth {
    pub sig_indices: Vec<u32>,
    #[serde(skip)]
    pub signers: Vec<ShortId>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum UnsignedTx {
    Base(BaseTx),
    AddSubnetValidator {
        base: BaseTx,
        validator: SubnetValidator,
        subnet_auth: SubnetAuth,
    },
}

impl UnsignedTx {
    const TYPE_BASE: u32 = 0x22;
    const TYPE_ADD_SUBNET_VALIDATOR: u32 = 0x0d;

    pub fn base(&self) -> &BaseTx {
        match self {
            UnsignedTx::Base(base) | UnsignedTx::AddSubnetValidator { base, .. } => base,
        }
    }

    pub fn inputs(&self) -> &[TransferableInput] {
        &self.base().inputs
    }

    /// Signature slot groups in credential order: one per input, then the
    /// subnet authorization if present.
    pub fn signature_groups(&self) -> Vec<&[ShortId]> {
        let mut groups: Vec<&[ShortId]> =
            self.inputs().iter().map(|i| i.signers.as_slice()).collect();
        if let UnsignedTx::AddSubnetValidator { subnet_auth, .. } = self {
            groups.push(subnet_auth.signers.as_slice());
        }
        groups
    }

    /// Canonical encoding. Excludes credentials and signer metadata.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(&CODEC_VERSION.to_le_bytes());
        match self {
            UnsignedTx::Base(base) => {
                buf.extend_from_slice(&Self::TYPE_BASE.to_le_bytes());
                base.encode(&mut buf);
            }
            UnsignedTx::AddSubnetValidator {
                base,
                validator,
                subnet_auth,
            } => {
                buf.extend_from_slice(&Self::TYPE_ADD_SUBNET_VALIDATOR.to_le_bytes());
                base.encode(&mut buf);
                buf.extend_from_slice(validator.node_id.short_id().as_bytes());
                buf.extend_from_slice(&validator.start.to_le_bytes());
                buf.extend_from_slice(&validator.end.to_le_bytes());
                buf.extend_from_slice(&validator.weight.to_le_bytes());
                buf.extend_from_slice(validator.subnet_id.as_bytes());
                put_len(&mut buf, subnet_auth.sig_indices.len());
                for idx in &subnet_auth.sig_indices {
                    buf.extend_from_slice(&idx.to_le_bytes());
                }
            }
        }
        buf
    }

    /// SHA-256 of the canonical encoding. This is what every signature covers.
    pub fn signing_hash(&self) -> Id {
        Id::digest(&self.to_bytes())
    }
}

/// Signatures for one signature group, in slot order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Credential {
    pub signatures: Vec<Signature>,
}

/// A transaction with its credentials.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    pub unsigned: UnsignedTx,
    pub credentials: Vec<Credential>,
}

impl Tx {
    pub fn new(unsigned: UnsignedTx) -> Self {
        Self {
            unsigned,
            credentials: Vec::new(),
        }
    }

    /// Signed encoding submitted to the chain.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.unsigned.to_bytes();
        put_len(&mut buf, self.credentials.len());
        for cred in &self.credentials {
            put_len(&mut buf, cred.signatures.len());
            for sig in &cred.signatures {
                buf.extend_from_slice(sig.as_bytes());
            }
        }
        buf
    }

    pub fn id(&self) -> Id {
        Id::digest(&self.to_bytes())
    }

    pub fn is_signed(&self) -> bool {
        !self.credentials.is_empty()
    }
}

fn put_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&(len as u32).to_le_bytes());
}
