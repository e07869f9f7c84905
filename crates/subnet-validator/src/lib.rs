//! # subnet-validator: add nodes to a subnet's validator set.
//!
//! Parses and validates a staking request, checks the holder can pay one fee
//! per node, asks for confirmation, then submits one transaction per node
//! under a deadline and reports what was accepted.
//!
//! # Modules
//!
//! - [`traits`]: `ChainClient` seam
//! - [`builder`]: add-subnet-validator transaction construction
//! - [`rpc`]: JSON-RPC `ChainClient`
//! - [`request`]: `StakingArgs` parsing and `ValidatorConfig`
//! - [`summary`]: cost summary rendering
//! - [`validator`]: the workflow

pub mod builder;
pub mod request;
pub mod rpc;
pub mod summary;
pub mod traits;
pub mod validator;

pub use builder::{StakeContext, build_add_subnet_validator_tx};
pub use request::{StakingArgs, StakingRequest, ValidatorConfig};
pub use rpc::RpcChainClient;
pub use summary::Summary;
pub use traits::{ChainClient, NetworkInfo, Submitted};
pub use validator::{AssumeYes, NodeOutcome, Phase, Prompt, Report, ValidatorAdder, WorkflowError};
