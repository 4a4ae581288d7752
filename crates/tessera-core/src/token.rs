use serde::{Deserialize, Serialize};

use crate::constants::{FIRST_TOKEN_ID, SECONDS_PER_DAY};
use crate::types::{Address, BlockNumber, Day, EpochId, Timestamp, TokenId};

/// Persisted per-token record. `birth_day` and `epoch_id` never change after mint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    pub id: TokenId,
    /// Current holder; retained as the last holder once burned.
    pub owner: Address,
    pub birth_day: Day,
    pub epoch_id: EpochId,
    pub minted_at_block: BlockNumber,
    pub burned: bool,
    /// Granted by the reserve rule rather than paid for.
    pub reserve: bool,
}

/// Read view of a token joined with its epoch's reveal flag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenView {
    pub id: TokenId,
    /// `None` once burned; a burned token has no holder.
    pub owner: Option<Address>,
    pub birth_day: Day,
    pub epoch_id: EpochId,
    pub is_revealed: bool,
    pub burned: bool,
    pub reserve: bool,
}

impl TokenView {
    pub fn new(record: &TokenRecord, is_revealed: bool) -> Self {
        Self {
            id: record.id,
            owner: (!record.burned).then_some(record.owner),
            birth_day: record.birth_day,
            epoch_id: record.epoch_id,
            is_revealed,
            burned: record.burned,
            reserve: record.reserve,
        }
    }
}

/// Aggregate supply bookkeeping, stored as one record so a call updates it atomically.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplyCounters {
    /// Every token ever created, reserve grants included.
    pub minted: u64,
    pub burned: u64,
    /// Tokens created for paying callers; drives the reserve rule.
    pub user_minted: u64,
    /// Next id under sequential allocation.
    pub next_token_id: TokenId,
}

impl SupplyCounters {
    pub fn total_supply(&self) -> u64 {
        self.minted.saturating_sub(self.burned)
    }
}

impl Default for SupplyCounters {
    fn default() -> Self {
        Self {
            minted: 0,
            burned: 0,
            user_minted: 0,
            next_token_id: FIRST_TOKEN_ID,
        }
    }
}

/// Day index of `now` relative to deployment; the deployment day is day 1.
pub fn birth_day(deployed_at: Timestamp, now: Timestamp) -> Day {
    let elapsed = now.saturating_sub(deployed_at).max(0);
    let days = elapsed / SECONDS_PER_DAY + 1;
    Day::try_from(days).unwrap_or(Day::MAX)
}
