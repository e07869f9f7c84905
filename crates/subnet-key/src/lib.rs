//! # subnet-key: key manager for platform-chain spends.
//!
//! A key backing knows its address ([`Addresser`]), selects UTXOs it can
//! spend and signs transactions over them ([`Spender`]). Selection is
//! deterministic: the same UTXO set and options always yield the same inputs.
//!
//! # Modules
//!
//! - [`error`]: `KeyError` for key loading
//! - [`key`]: `Addresser`, `Spender`, `Key` and `KeyRing` traits
//! - [`options`]: `SpendOptions`
//! - [`selection`]: deterministic UTXO selection
//! - [`signer`]: credential construction and verification
//! - [`soft`]: single in-memory key
//! - [`multisig`]: in-memory key group

pub mod error;
pub mod key;
pub mod multisig;
pub mod options;
pub mod selection;
pub mod signer;
pub mod soft;

pub use error::KeyError;
pub use key::{Addresser, Key, KeyRing, Spender};
pub use multisig::MultisigKey;
pub use options::SpendOptions;
pub use selection::{Spend, UtxoSelector};
pub use signer::TxSigner;
pub use soft::SoftKey;
