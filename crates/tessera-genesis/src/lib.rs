//! tessera-genesis
//!
//! Deploys a mint into an empty `StateDb`: writes the owner, the validated
//! `MintConfig`, the deployment timestamp (day 1 for birth days) and empty
//! ledger/supply records. Calls go through `StateEngine` afterwards.

pub mod params;

pub use params::DeployParams;

use tessera_core::epoch::LedgerHead;
use tessera_core::error::TesseraError;
use tessera_core::token::SupplyCounters;
use tessera_core::types::BlockContext;
use tessera_state::StateDb;
use tracing::info;

/// Apply a deployment to an empty `StateDb`.
///
/// Fails with `AlreadyDeployed` if the database already holds a deployment,
/// and with `Config` if the parameters are invalid. Nothing is written on
/// failure.
pub fn deploy(db: &StateDb, params: &DeployParams, at: &BlockContext) -> Result<(), TesseraError> {
    if db.is_deployed()? {
        return Err(TesseraError::AlreadyDeployed);
    }
    params.config.validate()?;

    db.put_owner(&params.owner)?;
    db.put_deployed_at(at.timestamp)?;
    db.put_head(&LedgerHead::default())?;
    db.put_counters(&SupplyCounters::default())?;
    db.put_contract_balance(0)?;
    db.put_last_block(at.number)?;
    // Written last: its presence is what marks the database as deployed.
    db.put_config(&params.config)?;
    db.flush()?;

    info!(
        owner = %params.owner,
        block = at.number,
        deployed_at = at.timestamp,
        reveal_delay = params.config.reveal_delay,
        unit_price = %params.config.unit_price,
        "deployed mint"
    );
    Ok(())
}
