use serde::{Deserialize, Serialize};

use crate::constants::FIRST_EPOCH_ID;
use crate::error::TesseraError;
use crate::types::{BlockNumber, EpochId, Seed};

// ── Epoch ────────────────────────────────────────────────────────────────────

/// A window of mints sharing one reveal event and one seed.
///
/// Only committed epochs are ever persisted, so a stored `Epoch` always has
/// `committed == true`. `seed` is written exactly once, in `reveal`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Epoch {
    pub id: EpochId,
    /// Block in which the first token was committed to this epoch.
    pub commit_block: BlockNumber,
    /// `commit_block + reveal_delay`; the block whose hash seeds the reveal.
    pub reveal_block: BlockNumber,
    pub committed: bool,
    pub revealed: bool,
    pub seed: Option<Seed>,
    /// True when the seed came from the degraded fallback instead of a block hash.
    pub degraded: bool,
}

impl Epoch {
    /// Open a new epoch whose first commit lands in `commit_block`.
    pub fn open(id: EpochId, commit_block: BlockNumber, reveal_delay: BlockNumber) -> Self {
        Self {
            id,
            commit_block,
            reveal_block: commit_block.saturating_add(reveal_delay),
            committed: true,
            revealed: false,
            seed: None,
            degraded: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.committed && !self.revealed
    }

    /// True once `current_block` has reached the reveal block.
    pub fn is_eligible(&self, current_block: BlockNumber) -> bool {
        self.is_open() && current_block >= self.reveal_block
    }

    /// Fix the epoch's seed. Fails if the epoch was already revealed.
    pub fn reveal(&mut self, seed: Seed, degraded: bool) -> Result<ResolvedEpoch, TesseraError> {
        if self.revealed {
            return Err(TesseraError::EpochAlreadyRevealed(self.id));
        }
        self.revealed = true;
        self.seed = Some(seed);
        self.degraded = degraded;
        Ok(ResolvedEpoch {
            epoch_id: self.id,
            reveal_block: self.reveal_block,
            seed,
            degraded,
        })
    }

    /// `revealed ⇒ committed` and `seed ⇔ revealed`.
    pub fn is_consistent(&self) -> bool {
        (!self.revealed || self.committed) && (self.seed.is_some() == self.revealed)
    }

    pub fn view(&self) -> EpochView {
        EpochView {
            committed: self.committed,
            revealed: self.revealed,
        }
    }
}

/// Public commit/reveal flags of an epoch. Ids never committed read as all-false.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpochView {
    pub committed: bool,
    pub revealed: bool,
}

/// Outcome of a successful resolution; drives the `NewEpoch` notification.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedEpoch {
    pub epoch_id: EpochId,
    pub reveal_block: BlockNumber,
    pub seed: Seed,
    pub degraded: bool,
}

// ── LedgerHead ───────────────────────────────────────────────────────────────

/// Explicit "current epoch" pointer, updated only at open/close transitions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerHead {
    /// Highest epoch id ever opened (0 at genesis).
    pub last_epoch_id: EpochId,
    /// The epoch currently committed but not revealed, if any.
    pub open_epoch: Option<EpochId>,
}

impl LedgerHead {
    /// The open epoch, or the id the next commit will receive.
    pub fn current_epoch_id(&self) -> EpochId {
        self.open_epoch.unwrap_or_else(|| self.next_epoch_id())
    }

    pub fn next_epoch_id(&self) -> EpochId {
        if self.last_epoch_id == 0 {
            FIRST_EPOCH_ID
        } else {
            self.last_epoch_id + 1
        }
    }
}
