//! CLI entry point that resolves configuration and runs one session command.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fixture_config::{
    Config, DEFAULT_CONFIG_PATH, FileConfig, Overrides, PrivateKey, load_file, resolve_config,
};
use fixture_core::{ConnectionCoordinator, ForkSpec, SnapshotHandle, TransactionOutcome};
use fixture_presets::{DEV_ACCOUNTS, NODE_CONTROL_METHODS};
use http::Uri;
use tracing::{debug, info, warn};

/// Parse CLI arguments, resolve a [`Config`], and run the requested command.
pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    debug!(config_path = %cli.config.display(), "parsed CLI arguments");

    match cli.command {
        Command::Accounts => {
            print_accounts();
            return Ok(());
        }
        Command::Methods => {
            for method in NODE_CONTROL_METHODS {
                println!("{method}");
            }
            return Ok(());
        }
        _ => {}
    }

    let config = cli.resolve_configuration()?;
    log_configuration(&config);

    let session = ConnectionCoordinator::from_config(&config)?;
    execute(&session, &config, cli.command).await
}

async fn execute(session: &ConnectionCoordinator, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Balance { address } => {
            let address = match address {
                Some(address) => address,
                None => session.current_address().await,
            };
            let balance = session.get_ether_balance(address).await?;
            println!("{balance}");
        }
        Command::Send { to, amount } => {
            let outcome = session.send_ether(to, amount).await?;
            print_outcome(&outcome);
            outcome.into_result()?;
        }
        Command::Snapshot => {
            let snapshot = session.make_snapshot().await?;
            println!("{snapshot}");
        }
        Command::Revert { id } => {
            session.restore_snapshot(SnapshotHandle::from_id(id)).await?;
            println!("reverted");
        }
        Command::TimeTravel { seconds } => {
            session.time_travel(seconds).await?;
            let block = session.latest_block().await?;
            println!("block {} at {}", block.number, block.timestamp);
        }
        Command::Impersonate { address, stop } => {
            if stop {
                session.stop_impersonating_account(address).await?;
                println!("stopped impersonating {address}");
            } else {
                session.impersonate_account(address).await?;
                println!("impersonating {address}");
            }
        }
        Command::Reset { block } => {
            let acknowledged = match config.fork() {
                Some(source) => {
                    let fork = ForkSpec::from_source(source, block).with_context(|| {
                        format!("forking {} requires a block number", source.as_str())
                    })?;
                    session.hardhat_reset(&fork).await?
                }
                None => {
                    if block.is_some() {
                        bail!("--block requires a fork URL");
                    }
                    session.reset_local().await?
                }
            };
            if !acknowledged {
                bail!("node did not acknowledge the reset");
            }
            println!("reset to block {}", session.block_number().await?);
        }
        Command::Block => {
            let block = session.latest_block().await?;
            println!("block {} at {}", block.number, block.timestamp);
        }
        Command::Accounts | Command::Methods => {}
    }
    Ok(())
}

fn print_accounts() {
    for (index, account) in DEV_ACCOUNTS.iter().enumerate() {
        println!("#{index} {}", account.address());
    }
}

fn print_outcome(outcome: &TransactionOutcome) {
    match outcome.transaction_hash() {
        Some(hash) => println!("transaction {hash}"),
        None => println!("transaction not submitted"),
    }
    if let Some(block) = outcome.block_number() {
        println!("block {block}, gas used {}", outcome.gas_used());
    }
    if outcome.is_success() {
        println!("status success, {} log(s)", outcome.logs().len());
    } else {
        println!(
            "status failure: {}",
            outcome.failure_reason().unwrap_or("no reason given")
        );
    }
}

fn log_configuration(config: &Config) {
    info!("using node {}", config.node_url());

    match config.fork() {
        Some(fork) => info!(block = ?fork.block(), "fork source configured"),
        None => debug!("no fork source configured"),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Drive a Hardhat node for test fixtures: balances, transfers, snapshots, time travel and forks."
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Override the node endpoint (e.g. http://127.0.0.1:8545).
    #[arg(long, value_name = "URL", global = true)]
    node_url: Option<Uri>,

    /// Hex-encoded private key the session signs with.
    #[arg(
        long,
        env = "FIXTURE_PRIVATE_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    private_key: Option<PrivateKey>,

    /// Sign with one of the node's prefunded development accounts instead.
    #[arg(long, value_name = "INDEX", conflicts_with = "private_key", global = true)]
    dev_account: Option<usize>,

    /// Upstream JSON-RPC endpoint to fork from.
    #[arg(long, value_name = "URL", global = true)]
    fork_url: Option<String>,

    /// API key appended to the fork URL.
    #[arg(long, value_name = "KEY", global = true)]
    fork_api_key: Option<String>,

    /// Block height to fork at.
    #[arg(long, value_name = "NUMBER", global = true)]
    fork_block: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the balance of an address in wei (defaults to the session's own).
    Balance {
        /// Account to query.
        address: Option<Address>,
    },
    /// Transfer wei from the session identity.
    Send {
        /// Recipient address.
        to: Address,
        /// Amount in wei.
        amount: U256,
    },
    /// Snapshot the chain state and print the snapshot id.
    Snapshot,
    /// Revert the chain to a snapshot id.
    Revert {
        /// Identifier printed by `snapshot`.
        id: String,
    },
    /// Advance the node clock and mine a block.
    TimeTravel {
        /// Seconds to advance.
        seconds: u64,
    },
    /// Let the node accept unsigned transactions from an address.
    Impersonate {
        /// Account to impersonate.
        address: Address,
        /// Stop impersonating instead.
        #[arg(long)]
        stop: bool,
    },
    /// Reset the node, onto the configured fork if there is one.
    Reset {
        /// Fork block, overriding the configured one.
        #[arg(long, value_name = "NUMBER")]
        block: Option<u64>,
    },
    /// Print the latest block number and timestamp.
    Block,
    /// List the prefunded development accounts.
    Accounts,
    /// List the node-control methods a session uses.
    Methods,
}

impl Cli {
    /// Merge `.fixture.toml` (if present) with CLI overrides into a [`Config`].
    fn resolve_configuration(&self) -> Result<Config> {
        let file_config = self.load_file_configuration()?;
        let private_key = match self.dev_account {
            Some(index) => {
                let account = DEV_ACCOUNTS.get(index).with_context(|| {
                    format!(
                        "no development account #{index}; there are {}",
                        DEV_ACCOUNTS.len()
                    )
                })?;
                Some(account.private_key())
            }
            None => self.private_key,
        };
        let overrides = Overrides::new(
            self.node_url.clone(),
            private_key,
            self.fork_url.clone(),
            self.fork_api_key.clone(),
            self.fork_block,
        );

        if overrides.is_empty() {
            debug!("no CLI overrides supplied");
        } else {
            debug!(
                node_override = ?self.node_url,
                key_override = private_key.is_some(),
                dev_account = ?self.dev_account,
                fork_override = self.fork_url.is_some(),
                fork_block_override = ?self.fork_block,
                "applying CLI overrides"
            );
        }

        let config = resolve_config(file_config, overrides)?;
        debug!(
            node_url = %config.node_url(),
            forking = config.fork().is_some(),
            gas_limit = config.transactions().gas_limit,
            "resolved effective configuration"
        );

        Ok(config)
    }

    /// Attempt to load a [`FileConfig`] from disk.
    fn load_file_configuration(&self) -> Result<Option<FileConfig>> {
        let file_config = load_file(self.config.as_path())?;

        if let Some(ref file) = file_config {
            debug!(
                path = %self.config.display(),
                has_key = file.private_key.is_some(),
                has_fork = file.fork_url.is_some(),
                "loaded configuration file"
            );
        }

        if file_config.is_none() && self.config.as_path() != Path::new(DEFAULT_CONFIG_PATH) {
            warn!(
                "configuration file {:?} not found; continuing with defaults and CLI overrides",
                self.config
            );
        }

        Ok(file_config)
    }
}
