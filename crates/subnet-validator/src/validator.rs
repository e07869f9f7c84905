//! Add-subnet-validator workflow.
//!
//! `Init -> BalanceCheck -> Confirm -> Submit[1..N] -> Reconcile`. Every
//! check that can fail locally runs before the first submission, including
//! whether the key can authorize changes to the subnet. Submissions are
//! sequential and each one (build, issue and commit) shares a single request
//! timeout; the first failure stops the loop, and transactions already
//! accepted stay accepted.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use subnet_core::address::Address;
use subnet_core::error::{ChainError, SigningError, StakeError};
use subnet_core::ids::{Id, NodeId, ShortId};
use subnet_key::Key;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::request::{StakingArgs, StakingRequest, ValidatorConfig};
use crate::summary::Summary;
use crate::traits::ChainClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    BalanceCheck,
    Confirm,
    Submit,
    Reconcile,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::BalanceCheck => "balance check",
            Phase::Confirm => "confirm",
            Phase::Submit => "submit",
            Phase::Reconcile => "reconcile",
        })
    }
}

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
    pub node_id: NodeId,
    pub subnet_id: Id,
    pub tx_id: Id,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Every node was added.
    Completed {
        outcomes: Vec<NodeOutcome>,
        /// Post-submission state with the fee zeroed.
        summary: Summary,
    },
    /// The user declined; nothing was submitted.
    Declined { summary: Summary },
}

/// A failed run: where it stopped, why, and what had already been accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{phase} failed: {source}")]
pub struct WorkflowError {
    pub phase: Phase,
    #[source]
    pub source: StakeError,
    pub completed: Vec<NodeOutcome>,
}

/// User interaction points of a run.
pub trait Prompt {
    /// Show `summary` and ask whether to go ahead.
    fn confirm(&mut self, summary: &Summary) -> bool;

    /// Show `summary` without asking, when prompting is disabled.
    fn show(&mut self, _summary: &Summary) {}

    /// A node was added.
    fn submitted(&mut self, _outcome: &NodeOutcome) {}
}

/// Accepts everything silently.
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&mut self, _summary: &Summary) -> bool {
        true
    }
}

pub struct ValidatorAdder<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    key: &'a dyn Key,
    network_id: u32,
    config: ValidatorConfig,
}

impl<'a, C: ChainClient + ?Sized> ValidatorAdder<'a, C> {
    /// `network_id` only selects the address prefix shown to the user.
    pub fn new(client: &'a C, key: &'a dyn Key, network_id: u32, config: ValidatorConfig) -> Self {
        Self {
            client,
            key,
            network_id,
            config,
        }
    }

    /// Parse `args` and run the workflow.
    pub async fn run(
        &self,
        args: &StakingArgs,
        prompt: &mut dyn Prompt,
    ) -> Result<Report, WorkflowError> {
        // Init
        let request = args.parse(self.key.address()).map_err(|e| WorkflowError {
            phase: Phase::Init,
            source: e.into(),
            completed: Vec::new(),
        })?;
        self.run_request(&request, prompt).await
    }

    /// Run the workflow for a request already parsed against this key.
    pub async fn run_request(
        &self,
        request: &StakingRequest,
        prompt: &mut dyn Prompt,
    ) -> Result<Report, WorkflowError> {
        let fail = |phase, source: StakeError, completed: Vec<NodeOutcome>| WorkflowError {
            phase,
            source,
            completed,
        };

        debug!(
            subnet_id = %request.subnet_id,
            nodes = request.node_ids.len(),
            weight = request.weight,
            "parsed staking request"
        );

        // BalanceCheck
        let (balance, tx_fee) = self
            .check_balance(request)
            .await
            .map_err(|e| fail(Phase::BalanceCheck, e, Vec::new()))?;
        let summary = Summary::new(
            request,
            self.key.p(),
            self.format_address(request.reward_addr),
            self.format_address(request.change_addr),
            balance,
            tx_fee,
        );

        // Confirm
        if self.config.enable_prompt {
            if !prompt.confirm(&summary) {
                info!("declined, nothing submitted");
                return Ok(Report::Declined { summary });
            }
        } else {
            prompt.show(&summary);
        }

        // Submit
        let mut outcomes = Vec::with_capacity(request.node_ids.len());
        for &node_id in &request.node_ids {
            match self.submit(request, node_id).await {
                Ok(outcome) => {
                    info!(
                        %node_id,
                        subnet_id = %outcome.subnet_id,
                        tx_id = %outcome.tx_id,
                        took = ?outcome.elapsed,
                        "added subnet validator"
                    );
                    prompt.submitted(&outcome);
                    outcomes.push(outcome);
                }
                Err(source) => {
                    warn!(%node_id, error = %source, accepted = outcomes.len(), "submission failed");
                    return Err(fail(Phase::Submit, source, outcomes));
                }
            }
        }

        // Reconcile
        let balance = match self.bounded(self.client.balance(self.key)).await {
            Ok(balance) => balance,
            Err(e) => return Err(fail(Phase::Reconcile, e.into(), outcomes)),
        };
        Ok(Report::Completed {
            summary: summary.reconciled(balance),
            outcomes,
        })
    }

    /// Fetch balance and fee, require enough for one fee per node, and
    /// require the key to meet the subnet's control threshold.
    async fn check_balance(&self, request: &StakingRequest) -> Result<(u64, u64), StakeError> {
        let tx_fee = self.bounded(self.client.tx_fee()).await?;
        let balance = self.bounded(self.client.balance(self.key)).await?;
        let need = tx_fee.saturating_mul(request.node_ids.len() as u64);
        if balance < need {
            return Err(StakeError::InsufficientFunds {
                have: balance,
                need,
            });
        }

        let owners = self
            .bounded(self.client.subnet_owners(request.subnet_id))
            .await?;
        if self.key.authorize(&owners).is_none() {
            return Err(SigningError::NotSubnetOwner {
                subnet_id: request.subnet_id.to_string(),
            }
            .into());
        }
        Ok((balance, tx_fee))
    }

    /// Build, issue and wait for one node's transaction under one deadline.
    ///
    /// Selection and signing failures are local; everything after the
    /// build is reported against the node.
    async fn submit(&self, request: &StakingRequest, node_id: NodeId) -> Result<NodeOutcome, StakeError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        let against_node = |source: ChainError| StakeError::Submission {
            node_id: node_id.to_string(),
            source,
        };

        let validator = request.validator(node_id);
        let prepared = self
            .until(
                deadline,
                self.client
                    .prepare_add_subnet_validator(self.key, &validator, request.change_addr),
            )
            .await;
        let tx = match prepared {
            Ok(tx) => tx,
            Err(ChainError::Selection(e)) => return Err(StakeError::Selection(e)),
            Err(ChainError::Signing(e)) => return Err(StakeError::Signing(e)),
            Err(e) => return Err(against_node(e)),
        };

        let tx_id = self
            .until(deadline, self.client.issue_tx(&tx))
            .await
            .map_err(against_node)?;
        debug!(%node_id, %tx_id, "issued");

        match tokio::time::timeout_at(deadline, self.client.wait_committed(tx_id)).await {
            Ok(result) => result.map_err(against_node)?,
            Err(_) => {
                return Err(against_node(ChainError::Unconfirmed {
                    tx_id: tx_id.to_string(),
                    after: self.config.request_timeout,
                }));
            }
        }

        Ok(NodeOutcome {
            node_id,
            subnet_id: request.subnet_id,
            tx_id,
            elapsed: started.elapsed(),
        })
    }

    /// Run `fut` under the request timeout. Expiry drops (cancels) it.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, ChainError> {
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        self.until(deadline, fut).await
    }

    async fn until<T>(
        &self,
        deadline: tokio::time::Instant,
        fut: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, ChainError> {
        tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| ChainError::Timeout(self.config.request_timeout))?
    }

    fn format_address(&self, addr: ShortId) -> String {
        Address::for_network(self.network_id, addr).to_string()
    }
}
