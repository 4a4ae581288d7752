use tessera_core::error::TesseraError;
use tessera_core::token::{TokenRecord, TokenView};
use tessera_core::types::{Address, TokenId};

use crate::db::StateDb;
use crate::ledger::epoch_view;

/// Read-side helpers over the token table: views joined with epoch state,
/// liveness checks and the owner / approval / operator authorization model.
pub struct TokenRegistry<'a> {
    db: &'a StateDb,
}

impl<'a> TokenRegistry<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// The token joined with its epoch's reveal flag. Burned tokens are
    /// returned too, with no owner.
    pub fn get(&self, id: TokenId) -> Result<Option<TokenView>, TesseraError> {
        match self.db.get_token(id)? {
            Some(record) => Ok(Some(self.view(&record)?)),
            None => Ok(None),
        }
    }

    pub fn view(&self, record: &TokenRecord) -> Result<TokenView, TesseraError> {
        let revealed = epoch_view(self.db, record.epoch_id)?.revealed;
        Ok(TokenView::new(record, revealed))
    }

    /// Fetch a token that exists and has not been burned.
    pub fn require_live(&self, id: TokenId) -> Result<TokenRecord, TesseraError> {
        let record = self.db.get_token(id)?.ok_or(TesseraError::TokenNotFound(id))?;
        if record.burned {
            return Err(TesseraError::TokenBurned(id));
        }
        Ok(record)
    }

    /// Owner or an operator of the owner.
    pub fn is_owner_or_operator(&self, record: &TokenRecord, caller: &Address) -> Result<bool, TesseraError> {
        Ok(record.owner == *caller || self.db.is_operator(&record.owner, caller)?)
    }

    /// Owner, the token's approved address, or an operator of the owner.
    pub fn is_authorized(&self, record: &TokenRecord, caller: &Address) -> Result<bool, TesseraError> {
        if self.is_owner_or_operator(record, caller)? {
            return Ok(true);
        }
        Ok(self.db.get_approval(record.id)? == Some(*caller))
    }

    /// Live tokens held by `owner`, in id order.
    pub fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenView>, TesseraError> {
        self.db
            .iter_tokens()?
            .iter()
            .filter(|t| !t.burned && t.owner == *owner)
            .map(|t| self.view(t))
            .collect()
    }

    pub fn total_supply(&self) -> Result<u64, TesseraError> {
        Ok(self.db.counters()?.total_supply())
    }
}
