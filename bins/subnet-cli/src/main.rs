//! subnet-cli: add nodes to a subnet's validator set.
//!
//! ```text
//! $ subnet-cli add subnet-validator \
//!     --private-key-path=.insecure.key \
//!     --public-uri=http://localhost:9650 \
//!     --subnet-id=24tZhrm8j8GCJRE9PomW8FaeqbgGS4UAQjJnqqn8pq5NwYSYV1 \
//!     --node-ids=NodeID-4B4rc5vdD1758JSBYL1xyvE5NHGzz6xzH \
//!     --validate-weight=1000
//! ```

mod config;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use chrono::{DateTime, Utc};
use subnet_core::constants::{DEFAULT_VALIDATE_WEIGHT, FUJI_ID};
use subnet_core::error::StakeError;
use subnet_core::ids::ShortId;
use subnet_key::{Addresser, SoftKey};
use subnet_validator::summary::format_units;
use subnet_validator::{
    ChainClient, NodeOutcome, Prompt, Report, RpcChainClient, StakingArgs, StakingRequest,
    Summary, ValidatorAdder,
};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "subnet-cli")]
#[command(version, about = "Subnet validator management.")]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Node URI (default: $SUBNET_PUBLIC_URI or http://127.0.0.1:9650).
    #[arg(long, global = true)]
    public_uri: Option<String>,

    /// Hex key file (default: $SUBNET_PRIVATE_KEY_PATH or ~/.subnet-cli/key.hex).
    #[arg(long, global = true)]
    private_key_path: Option<PathBuf>,

    /// Ask before submitting anything.
    #[arg(long, global = true, default_value_t = true, action = ArgAction::Set)]
    enable_prompt: bool,

    /// Deadline per request, e.g. 90s or 2m (default: 2m).
    #[arg(long, global = true)]
    request_timeout: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create resources.
    Create {
        #[command(subcommand)]
        what: CreateCommand,
    },
    /// Add resources.
    Add {
        #[command(subcommand)]
        what: AddCommand,
    },
}

#[derive(Subcommand)]
enum CreateCommand {
    /// Generate a new key file at --private-key-path.
    Key(CreateKeyArgs),
}

#[derive(Subcommand)]
enum AddCommand {
    /// Add nodes to a subnet's validator set.
    SubnetValidator(SubnetValidatorArgs),
}

#[derive(Args)]
struct CreateKeyArgs {
    /// Network whose address format to print.
    #[arg(long, default_value_t = FUJI_ID)]
    network_id: u32,
}

#[derive(Args)]
struct SubnetValidatorArgs {
    /// Subnet ID (cb58).
    #[arg(long)]
    subnet_id: String,

    /// Comma-separated node IDs (NodeID-...).
    #[arg(long, value_delimiter = ',', required = true)]
    node_ids: Vec<String>,

    /// RFC3339 start (default: one minute from now).
    #[arg(long)]
    validate_start: Option<String>,

    /// RFC3339 end (default: 50 days after start).
    #[arg(long)]
    validate_end: Option<String>,

    #[arg(long, default_value_t = DEFAULT_VALIDATE_WEIGHT)]
    validate_weight: u64,

    /// P-chain reward address (default: the key's address).
    #[arg(long)]
    reward_address: Option<String>,

    /// P-chain change address (default: the key's address).
    #[arg(long)]
    change_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = CliConfig::resolve(
        cli.globals.public_uri,
        cli.globals.private_key_path,
        cli.globals.request_timeout.as_deref(),
        cli.globals.enable_prompt,
        |k| std::env::var(k).ok(),
    )?;

    match cli.command {
        Commands::Create {
            what: CreateCommand::Key(args),
        } => create_key(&config, args),
        Commands::Add {
            what: AddCommand::SubnetValidator(args),
        } => add_subnet_validator(&config, args).await,
    }
}

fn create_key(config: &CliConfig, args: CreateKeyArgs) -> Result<()> {
    if let Some(parent) = config.private_key_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let key = SoftKey::generate(args.network_id);
    key.save_to_file(&config.private_key_path)
        .context("failed to write key file")?;

    println!("Key written to {}", config.private_key_path.display());
    println!("Address: {}", key.p());
    Ok(())
}

/// Fill in the default window and validate everything local.
fn staking_request(
    args: SubnetValidatorArgs,
    holder: ShortId,
    now: DateTime<Utc>,
) -> Result<StakingRequest, StakeError> {
    let (validate_start, validate_end) =
        config::default_window(args.validate_start, args.validate_end, now);
    let staking = StakingArgs {
        subnet_id: args.subnet_id,
        node_ids: args.node_ids,
        validate_start,
        validate_end,
        validate_weight: args.validate_weight,
        reward_address: args.reward_address,
        change_address: args.change_address,
    };
    Ok(staking.parse(holder)?)
}

async fn add_subnet_validator(config: &CliConfig, args: SubnetValidatorArgs) -> Result<()> {
    // The network id only changes how addresses render; rebound after connecting.
    let key = SoftKey::load_from_file(&config.private_key_path, FUJI_ID).with_context(|| {
        format!(
            "failed to load key from {}",
            config.private_key_path.display()
        )
    })?;
    let request = staking_request(args, key.address(), Utc::now())?;

    let client = RpcChainClient::connect(&config.public_uri, config.request_timeout)
        .await
        .with_context(|| format!("failed to reach {}", config.public_uri))?;
    let network_id = client.network_info().await?.network_id;
    let key = key.with_network_id(network_id);

    let adder = ValidatorAdder::new(&client, &key, network_id, config.validator_config());
    match adder.run_request(&request, &mut TerminalPrompt).await {
        Ok(Report::Declined { .. }) => {
            println!("Nothing submitted.");
            Ok(())
        }
        Ok(Report::Completed { summary, .. }) => {
            println!();
            print!("{summary}");
            Ok(())
        }
        Err(e) => {
            if !e.completed.is_empty() {
                println!("Accepted before the failure:");
                for outcome in &e.completed {
                    println!("  {} (tx {})", outcome.node_id, outcome.tx_id);
                }
            }
            bail!(e)
        }
    }
}

/// Renders to stdout and reads the answer from stdin.
struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, summary: &Summary) -> bool {
        println!("\nReady to add subnet validator, should we continue?\n");
        print!("{summary}");
        print!(
            "\nPay {} in fees and continue? [y/N] ",
            format_units(summary.total_fee())
        );
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn show(&mut self, summary: &Summary) {
        print!("{summary}");
    }

    fn submitted(&mut self, outcome: &NodeOutcome) {
        println!(
            "added {} to subnet {} validator set (took {:?})",
            outcome.node_id, outcome.subnet_id, outcome.elapsed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use subnet_core::error::InputError;

    fn args(weight: u64) -> SubnetValidatorArgs {
        SubnetValidatorArgs {
            subnet_id: "24tZhrm8j8GCJRE9PomW8FaeqbgGS4UAQjJnqqn8pq5NwYSYV1".into(),
            node_ids: vec!["NodeID-4B4rc5vdD1758JSBYL1xyvE5NHGzz6xzH".into()],
            validate_start: None,
            validate_end: None,
            validate_weight: weight,
            reward_address: None,
            change_address: None,
        }
    }

    #[test]
    fn request_gets_default_window() {
        let now = DateTime::from_timestamp(1_893_456_000, 0).unwrap();
        let holder = ShortId([3; 20]);
        let request = staking_request(args(1_000), holder, now).unwrap();
        assert_eq!(request.start.timestamp(), 1_893_456_060);
        assert_eq!(request.duration(), Duration::from_secs(50 * 86_400));
        assert_eq!(request.change_addr, holder);
    }

    #[tokio::test]
    async fn invalid_input_reported_without_reaching_the_node() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.hex");
        SoftKey::generate(FUJI_ID).save_to_file(&key_path).unwrap();
        let config = CliConfig {
            // Nothing listens here; connecting would fail with a transport error.
            public_uri: "http://127.0.0.1:1".into(),
            private_key_path: key_path,
            request_timeout: Duration::from_secs(1),
            enable_prompt: false,
        };

        let err = add_subnet_validator(&config, args(0)).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StakeError>(),
            Some(&StakeError::InvalidInput(InputError::ZeroWeight))
        );
    }
}
