//! tessera-node: drives a Tessera mint against a simulated chain.
//!
//! Every invocation:
//!   1. Opens the state database under `--data-dir`
//!   2. Loads the simulated chain persisted next to it
//!   3. Runs one command (mutating commands seal their own block)
//!   4. Prints the result as JSON on stdout
//!
//! Logs go to stderr so stdout stays machine-readable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use tessera_core::call::{Action, Call, MintSelection};
use tessera_core::config::MintConfig;
use tessera_core::token::TokenView;
use tessera_core::types::{Address, BlockContext, BlockNumber, EpochId, Timestamp, TokenId, Wei};
use tessera_crypto::{address_from_label, BlockHashResolver, SimulatedChain};
use tessera_genesis::{deploy, DeployParams};
use tessera_query::{PendingReveal, StatusReport, TesseraQuery};
use tessera_state::{StateDb, StateEngine};

/// Meta key holding the bincode-encoded `SimulatedChain`.
const CHAIN_META_KEY: &str = "chain";

#[derive(Parser, Debug)]
#[command(
    name = "tessera-node",
    version,
    about = "Tessera commit-reveal mint, run against a local simulated chain"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.tessera/data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// 0.1 ETH per token, sequential ids, reserve grants and proceeds split.
    Paid,
    /// Free mint of caller-chosen ids, no reserve.
    OpenIds,
}

/// Addresses are `0x` hex, or any other string as a dev-account label.
#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy a new mint into an empty data directory.
    Deploy {
        /// Deployment owner (allowed to withdraw proceeds); defaults to the `owner` dev account.
        #[arg(long)]
        owner: Option<String>,
        /// Path to deploy params JSON (`{"owner": .., "config": ..}`).
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "paid")]
        preset: Preset,
        /// 32-byte hex salt for simulated block hashes; random if omitted.
        #[arg(long)]
        salt: Option<String>,
        #[arg(long, default_value_t = 1)]
        start_block: u64,
    },
    /// Seal empty blocks.
    Mine {
        #[arg(default_value_t = 1)]
        blocks: u64,
    },
    /// Advance the clock by `secs` and seal one block.
    IncreaseTime { secs: i64 },
    /// Mint tokens. Pays `quantity × price` unless `--value` is given.
    Mint {
        #[arg(long)]
        from: String,
        #[arg(long)]
        quantity: Option<u32>,
        /// Caller-supplied ids (comma-separated), for open-id deployments.
        #[arg(long, value_delimiter = ',')]
        ids: Vec<TokenId>,
        /// Recipient; defaults to the caller.
        #[arg(long)]
        to: Option<String>,
        /// Payment in wei.
        #[arg(long)]
        value: Option<Wei>,
    },
    /// Reveal the open epoch if its reveal block has been reached.
    ResolveEpoch {
        #[arg(long, default_value = "keeper")]
        from: String,
    },
    Burn {
        #[arg(long)]
        from: String,
        token_id: TokenId,
    },
    /// Approve a spender for one token; omit `--spender` to clear.
    Approve {
        #[arg(long)]
        from: String,
        token_id: TokenId,
        #[arg(long)]
        spender: Option<String>,
    },
    /// Grant (or with `--revoke`, remove) operator rights over all tokens.
    ApproveAll {
        #[arg(long)]
        from: String,
        operator: String,
        #[arg(long)]
        revoke: bool,
    },
    /// Withdraw retained proceeds to the owner; defaults to the full balance.
    Withdraw {
        #[arg(long)]
        from: String,
        #[arg(long)]
        amount: Option<Wei>,
    },
    Token { id: TokenId },
    /// Live tokens held by an address.
    Tokens { owner: String },
    /// Epoch flags; defaults to the current epoch id.
    Epoch { id: Option<EpochId> },
    Status,
    /// Renderer inputs for a token (seed only once revealed).
    RevealInput { id: TokenId },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tessera=debug")),
        )
        .init();

    let args = Args::parse();

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    debug!(data_dir = %data_dir.display(), "state database open");

    let output = run(&db, args.command)?;
    db.flush().context("flushing state database")?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// ── Command output ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DeployReport<'a> {
    deployed: bool,
    owner: Address,
    config: &'a MintConfig,
    block: BlockNumber,
}

#[derive(Serialize)]
struct BlockReport {
    block: BlockNumber,
    timestamp: Timestamp,
}

impl From<BlockContext> for BlockReport {
    fn from(ctx: BlockContext) -> Self {
        Self { block: ctx.number, timestamp: ctx.timestamp }
    }
}

#[derive(Serialize)]
struct TokenReport {
    token: TokenView,
    summary: String,
}

#[derive(Serialize)]
struct HoldingsReport {
    owner: Address,
    tokens: Vec<TokenView>,
}

#[derive(Serialize)]
struct EpochReport {
    epoch_id: EpochId,
    committed: bool,
    revealed: bool,
}

#[derive(Serialize)]
struct StatusOutput {
    status: StatusReport,
    chain: BlockReport,
    pending_reveal: Option<PendingReveal>,
}

fn to_json<T: Serialize>(output: &T) -> anyhow::Result<Value> {
    serde_json::to_value(output).context("encoding command output")
}

fn run(db: &Arc<StateDb>, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Deploy { owner, params, preset, salt, start_block } => {
            let mut params = match params {
                Some(path) => load_deploy_params(&path)?,
                None => DeployParams::new(address_from_label("owner"), preset_config(preset)),
            };
            if let Some(owner) = owner {
                params.owner = parse_address(&owner)?;
            }
            let now = chrono::Utc::now().timestamp();
            let chain = match salt {
                Some(hex) => SimulatedChain::new(parse_salt(&hex)?, start_block, now),
                None => SimulatedChain::random(start_block, now),
            };
            deploy(db, &params, &chain.context()).context("deploying mint")?;
            save_chain(db, &chain)?;
            info!(owner = %params.owner, "deployment complete");
            to_json(&DeployReport {
                deployed: true,
                owner: params.owner,
                config: &params.config,
                block: chain.height(),
            })
        }

        Command::Mine { blocks } => {
            let mut chain = load_chain(db)?;
            let ctx = chain.mine(blocks);
            save_chain(db, &chain)?;
            to_json(&BlockReport::from(ctx))
        }

        Command::IncreaseTime { secs } => {
            let mut chain = load_chain(db)?;
            let ctx = chain.increase_time(secs);
            save_chain(db, &chain)?;
            to_json(&BlockReport::from(ctx))
        }

        Command::Mint { from, quantity, ids, to, value } => {
            let from = parse_address(&from)?;
            let recipient = match to {
                Some(to) => parse_address(&to)?,
                None => from,
            };
            let selection = match (quantity, ids.is_empty()) {
                (Some(q), true) => MintSelection::Quantity(q),
                (None, false) => MintSelection::Ids(ids),
                (None, true) => MintSelection::Quantity(1),
                (Some(_), false) => anyhow::bail!("pass either --quantity or --ids, not both"),
            };
            let price = db.config()?.unit_price;
            let payment = value.unwrap_or_else(|| price.saturating_mul(selection.len() as Wei));
            submit(db, from, Action::Mint { selection, recipient, payment })
        }

        Command::ResolveEpoch { from } => submit(db, parse_address(&from)?, Action::ResolveEpoch),

        Command::Burn { from, token_id } => {
            submit(db, parse_address(&from)?, Action::Burn { token_id })
        }

        Command::Approve { from, token_id, spender } => {
            let spender = spender.as_deref().map(parse_address).transpose()?;
            submit(db, parse_address(&from)?, Action::Approve { token_id, spender })
        }

        Command::ApproveAll { from, operator, revoke } => {
            let action = Action::SetApprovalForAll {
                operator: parse_address(&operator)?,
                approved: !revoke,
            };
            submit(db, parse_address(&from)?, action)
        }

        Command::Withdraw { from, amount } => {
            let amount = match amount {
                Some(a) => a,
                None => db.contract_balance()?,
            };
            submit(db, parse_address(&from)?, Action::Withdraw { amount })
        }

        Command::Token { id } => {
            let query = TesseraQuery::new(db);
            let token = query.get_token(id)?;
            to_json(&TokenReport { token, summary: query.describe_token(id)? })
        }

        Command::Tokens { owner } => {
            let owner = parse_address(&owner)?;
            let tokens = TesseraQuery::new(db).tokens_of(&owner)?;
            to_json(&HoldingsReport { owner, tokens })
        }

        Command::Epoch { id } => {
            let query = TesseraQuery::new(db);
            let id = match id {
                Some(id) => id,
                None => query.current_epoch_id()?,
            };
            let view = query.get_epoch(id)?;
            to_json(&EpochReport { epoch_id: id, committed: view.committed, revealed: view.revealed })
        }

        Command::Status => {
            let query = TesseraQuery::new(db);
            let chain = load_chain(db)?;
            to_json(&StatusOutput {
                status: query.status()?,
                chain: chain.context().into(),
                pending_reveal: query.pending_reveal(chain.height())?,
            })
        }

        Command::RevealInput { id } => {
            to_json(&TesseraQuery::new(db).reveal_input(id)?)
        }
    }
}

/// Seal a block and apply one call in it. The block is only kept if the call
/// succeeds; once it has, the chain is saved before the receipt is encoded.
fn submit(db: &Arc<StateDb>, from: Address, action: Action) -> anyhow::Result<Value> {
    let mut chain = load_chain(db)?;
    let resolver = BlockHashResolver::new(chain.clone());
    let engine = StateEngine::new(Arc::clone(db), Box::new(resolver)).context("loading engine")?;

    let ctx = chain.mine(1);
    let receipt = engine.apply(&Call::new(from, action), &ctx)?;
    save_chain(db, &chain)?;
    to_json(&receipt)
}

fn preset_config(preset: Preset) -> MintConfig {
    match preset {
        Preset::Paid => MintConfig::default(),
        Preset::OpenIds => MintConfig::open_ids(),
    }
}

fn load_deploy_params(path: &Path) -> anyhow::Result<DeployParams> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading deploy params from {}", path.display()))?;
    DeployParams::from_json(&json).context("parsing deploy params JSON")
}

fn load_chain(db: &StateDb) -> anyhow::Result<SimulatedChain> {
    let bytes = db
        .get_meta(CHAIN_META_KEY)?
        .context("no simulated chain found; run `deploy` first")?;
    bincode::deserialize(&bytes).context("decoding simulated chain")
}

fn save_chain(db: &StateDb, chain: &SimulatedChain) -> anyhow::Result<()> {
    db.put_meta(CHAIN_META_KEY, &bincode::serialize(chain)?)?;
    Ok(())
}

fn parse_address(s: &str) -> anyhow::Result<Address> {
    if s.starts_with("0x") {
        Address::from_hex(s).with_context(|| format!("invalid address {s}"))
    } else {
        Ok(address_from_label(s))
    }
}

fn parse_salt(s: &str) -> anyhow::Result<[u8; 32]> {
    let mut salt = [0u8; 32];
    hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut salt)
        .with_context(|| format!("invalid salt {s}"))?;
    Ok(salt)
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
