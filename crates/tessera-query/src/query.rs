use serde::{Deserialize, Serialize};
use tessera_core::epoch::EpochView;
use tessera_core::error::TesseraError;
use tessera_core::token::TokenView;
use tessera_core::types::{Address, BlockNumber, EpochId, TokenId, Wei};
use tessera_state::ledger::epoch_view;
use tessera_state::{StateDb, TokenRegistry};

use crate::reveal::{PendingReveal, RevealInput};

/// Snapshot of a deployment, as reported by `status`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub owner: Address,
    pub current_epoch_id: EpochId,
    pub open_epoch: Option<EpochId>,
    pub total_supply: u64,
    pub minted: u64,
    pub burned: u64,
    /// Decimal string in JSON.
    #[serde(with = "tessera_core::types::wei")]
    pub contract_balance: Wei,
    pub last_block: Option<BlockNumber>,
}

/// Query helpers over a deployed mint. All methods are pure reads.
pub struct TesseraQuery<'a> {
    db: &'a StateDb,
}

impl<'a> TesseraQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get_token(&self, id: TokenId) -> Result<TokenView, TesseraError> {
        TokenRegistry::new(self.db)
            .get(id)?
            .ok_or(TesseraError::TokenNotFound(id))
    }

    /// Unknown ids read as `{committed: false, revealed: false}`.
    pub fn get_epoch(&self, id: EpochId) -> Result<EpochView, TesseraError> {
        epoch_view(self.db, id)
    }

    pub fn current_epoch_id(&self) -> Result<EpochId, TesseraError> {
        Ok(self.db.head()?.current_epoch_id())
    }

    pub fn total_supply(&self) -> Result<u64, TesseraError> {
        TokenRegistry::new(self.db).total_supply()
    }

    /// The open epoch's countdown as seen from `current_block`, if one is open.
    pub fn pending_reveal(&self, current_block: BlockNumber) -> Result<Option<PendingReveal>, TesseraError> {
        let Some(id) = self.db.head()?.open_epoch else {
            return Ok(None);
        };
        Ok(self
            .db
            .get_epoch(id)?
            .map(|e| PendingReveal::new(&e, current_block)))
    }

    pub fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenView>, TesseraError> {
        TokenRegistry::new(self.db).tokens_of(owner)
    }

    /// Renderer inputs for a token; burned tokens included.
    pub fn reveal_input(&self, id: TokenId) -> Result<RevealInput, TesseraError> {
        let token = self.db.get_token(id)?.ok_or(TesseraError::TokenNotFound(id))?;
        let epoch = self.db.get_epoch(token.epoch_id)?;
        Ok(RevealInput::new(&token, epoch.as_ref()))
    }

    pub fn contract_balance(&self) -> Result<Wei, TesseraError> {
        self.db.contract_balance()
    }

    pub fn payouts_of(&self, who: &Address) -> Result<Wei, TesseraError> {
        self.db.get_payout(who)
    }

    pub fn mint_count_of(&self, who: &Address) -> Result<u32, TesseraError> {
        self.db.get_mint_count(who)
    }

    pub fn status(&self) -> Result<StatusReport, TesseraError> {
        let head = self.db.head()?;
        let counters = self.db.counters()?;
        Ok(StatusReport {
            owner: self.db.owner()?,
            current_epoch_id: head.current_epoch_id(),
            open_epoch: head.open_epoch,
            total_supply: counters.total_supply(),
            minted: counters.minted,
            burned: counters.burned,
            contract_balance: self.db.contract_balance()?,
            last_block: self.db.last_block()?,
        })
    }

    /// Human-readable summary of a token's state.
    pub fn describe_token(&self, id: TokenId) -> Result<String, TesseraError> {
        let t = self.get_token(id)?;
        let state = if t.burned {
            "burned".to_string()
        } else if t.is_revealed {
            "revealed".to_string()
        } else {
            match self.pending_reveal(self.db.last_block()?.unwrap_or(0))? {
                Some(p) if p.epoch_id == t.epoch_id && !p.is_ready() => {
                    format!("unrevealed, {} blocks to reveal", p.blocks_remaining)
                }
                _ => "unrevealed, ready to resolve".to_string(),
            }
        };
        let kind = if t.reserve { " (reserve)" } else { "" };
        let owner = t.owner.map_or_else(|| "none".to_string(), |a| a.to_string());
        Ok(format!(
            "Token {}{} | owner: {} | day {} | epoch {} | {}",
            t.id, kind, owner, t.birth_day, t.epoch_id, state
        ))
    }
}
