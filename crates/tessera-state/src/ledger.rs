use std::collections::BTreeMap;

use tessera_core::epoch::{Epoch, EpochView, LedgerHead, ResolvedEpoch};
use tessera_core::error::TesseraError;
use tessera_core::types::{BlockContext, BlockNumber, EpochId};
use tessera_crypto::hash::degraded_seed;
use tessera_crypto::randomness::RandomnessResolver;
use tracing::{debug, info, warn};

use crate::db::StateDb;

/// In-memory view of the epoch table for one call.
///
/// Loaded from the database, mutated by `resolve_if_necessary` and `commit`,
/// and handed back via `into_changes` so the engine can stage the writes with
/// everything else the call touches.
pub struct EpochLedger {
    head: LedgerHead,
    open: Option<Epoch>,
    reveal_delay: BlockNumber,
    changed: BTreeMap<EpochId, Epoch>,
}

impl EpochLedger {
    pub fn load(db: &StateDb, reveal_delay: BlockNumber) -> Result<Self, TesseraError> {
        let head = db.head()?;
        let open = match head.open_epoch {
            Some(id) => Some(db.get_epoch(id)?.ok_or_else(|| {
                TesseraError::Storage(format!("ledger head points at missing epoch {id}"))
            })?),
            None => None,
        };
        Ok(Self {
            head,
            open,
            reveal_delay,
            changed: BTreeMap::new(),
        })
    }

    /// The committed-but-unrevealed epoch, if any.
    pub fn open_epoch(&self) -> Option<&Epoch> {
        self.open.as_ref()
    }

    pub fn current_epoch_id(&self) -> EpochId {
        self.head.current_epoch_id()
    }

    /// Reveal the open epoch once `at` has reached its reveal block.
    ///
    /// Returns `None` when nothing is open or the open epoch is not yet
    /// eligible. If the resolver cannot produce the reveal-block seed the
    /// epoch is revealed with a degraded seed instead of failing.
    pub fn resolve_if_necessary(
        &mut self,
        at: &BlockContext,
        resolver: &dyn RandomnessResolver,
    ) -> Result<Option<ResolvedEpoch>, TesseraError> {
        let eligible = matches!(&self.open, Some(e) if e.is_eligible(at.number));
        if !eligible {
            return Ok(None);
        }
        let Some(mut epoch) = self.open.take() else {
            return Ok(None);
        };

        let (seed, degraded) = match resolver.seed_for(epoch.reveal_block, at) {
            Ok(seed) => (seed, false),
            Err(TesseraError::RandomnessUnavailable { block }) => {
                warn!(
                    epoch_id = epoch.id,
                    reveal_block = block,
                    current_block = at.number,
                    "reveal block hash unavailable; using degraded seed"
                );
                (degraded_seed(epoch.id, epoch.reveal_block, at.number), true)
            }
            Err(e) => {
                self.open = Some(epoch);
                return Err(e);
            }
        };

        let resolved = epoch.reveal(seed, degraded)?;
        self.head.open_epoch = None;
        self.changed.insert(epoch.id, epoch);
        info!(
            epoch_id = resolved.epoch_id,
            reveal_block = resolved.reveal_block,
            degraded,
            "epoch revealed"
        );
        Ok(Some(resolved))
    }

    /// Bind new tokens committed in `block` to an epoch: the open one if it
    /// exists, otherwise a freshly opened one.
    pub fn commit(&mut self, block: BlockNumber) -> EpochId {
        if let Some(open) = &self.open {
            debug!(epoch_id = open.id, block, "joining open epoch");
            return open.id;
        }
        let id = self.head.next_epoch_id();
        let epoch = Epoch::open(id, block, self.reveal_delay);
        debug!(epoch_id = id, reveal_block = epoch.reveal_block, "opened epoch");
        self.head.last_epoch_id = id;
        self.head.open_epoch = Some(id);
        self.changed.insert(id, epoch.clone());
        self.open = Some(epoch);
        id
    }

    /// The updated head plus every epoch written during this call.
    pub fn into_changes(self) -> (LedgerHead, Vec<Epoch>) {
        (self.head, self.changed.into_values().collect())
    }
}

/// Commit/reveal flags for `id`; ids never committed read as all-false.
pub fn epoch_view(db: &StateDb, id: EpochId) -> Result<EpochView, TesseraError> {
    Ok(db.get_epoch(id)?.map(|e| e.view()).unwrap_or_default())
}
