use tessera_core::constants::BLOCK_HASH_WINDOW;
use tessera_core::error::TesseraError;
use tessera_core::types::{BlockContext, BlockNumber, Seed};

use crate::chain::BlockHashSource;
use crate::hash::seed_from_block_hash;

/// Source of reveal randomness, injected into the state engine.
///
/// Implementations must only return seeds derived from information that did
/// not exist when the epoch was committed.
pub trait RandomnessResolver {
    /// Seed for an epoch whose reveal block is `reveal_block`, evaluated from
    /// a call executing in `at`.
    fn seed_for(&self, reveal_block: BlockNumber, at: &BlockContext) -> Result<Seed, TesseraError>;
}

/// Production resolver: the hash of the reveal block, while it is still
/// within the host chain's lookup window.
///
/// Whether the reveal block's hash is readable from inside the reveal block
/// itself is up to the [`BlockHashSource`]. Sources that withhold it make a
/// resolution at exactly `reveal_block` report `RandomnessUnavailable`.
pub struct BlockHashResolver<S> {
    source: S,
    window: BlockNumber,
}

impl<S: BlockHashSource> BlockHashResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source, window: BLOCK_HASH_WINDOW }
    }

    pub fn with_window(mut self, window: BlockNumber) -> Self {
        self.window = window;
        self
    }
}

impl<S: BlockHashSource> RandomnessResolver for BlockHashResolver<S> {
    fn seed_for(&self, reveal_block: BlockNumber, at: &BlockContext) -> Result<Seed, TesseraError> {
        let unavailable = TesseraError::RandomnessUnavailable { block: reveal_block };
        if reveal_block > at.number || at.number - reveal_block > self.window {
            return Err(unavailable);
        }
        let hash = self.source.block_hash(reveal_block, at.number).ok_or(unavailable)?;
        Ok(seed_from_block_hash(&hash, reveal_block))
    }
}

/// Always returns the same seed. For tests and local tooling.
#[derive(Clone, Copy, Debug)]
pub struct StaticResolver(pub Seed);

impl RandomnessResolver for StaticResolver {
    fn seed_for(&self, _reveal_block: BlockNumber, _at: &BlockContext) -> Result<Seed, TesseraError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SimulatedChain;

    fn resolver() -> BlockHashResolver<SimulatedChain> {
        BlockHashResolver::new(SimulatedChain::new([5u8; 32], 0, 0))
    }

    #[test]
    fn seed_available_at_and_after_reveal_block() {
        let r = resolver();
        let at_reveal = r.seed_for(60, &BlockContext::new(60, 0)).unwrap();
        let later = r.seed_for(60, &BlockContext::new(200, 0)).unwrap();
        assert_eq!(at_reveal, later);
    }

    #[test]
    fn seed_unavailable_before_reveal_block() {
        let err = resolver().seed_for(60, &BlockContext::new(59, 0)).unwrap_err();
        assert!(matches!(err, TesseraError::RandomnessUnavailable { block: 60 }));
    }

    #[test]
    fn seed_unavailable_outside_window() {
        let r = resolver();
        assert!(r.seed_for(60, &BlockContext::new(60 + BLOCK_HASH_WINDOW, 0)).is_ok());
        let err = r.seed_for(60, &BlockContext::new(61 + BLOCK_HASH_WINDOW, 0)).unwrap_err();
        assert!(matches!(err, TesseraError::RandomnessUnavailable { .. }));
    }

    /// Host-chain semantics: the executing block has no hash yet.
    struct SealedOnly(SimulatedChain);

    impl BlockHashSource for SealedOnly {
        fn block_hash(&self, number: BlockNumber, head: BlockNumber) -> Option<[u8; 32]> {
            if number < head {
                self.0.block_hash(number, head)
            } else {
                None
            }
        }
    }

    #[test]
    fn executing_block_hash_depends_on_source() {
        let chain = SimulatedChain::new([5u8; 32], 0, 0);
        let at_reveal = BlockContext::new(60, 0);
        assert!(BlockHashResolver::new(chain.clone()).seed_for(60, &at_reveal).is_ok());

        let strict = BlockHashResolver::new(SealedOnly(chain.clone()));
        let err = strict.seed_for(60, &at_reveal).unwrap_err();
        assert!(matches!(err, TesseraError::RandomnessUnavailable { block: 60 }));
        assert_eq!(
            strict.seed_for(60, &BlockContext::new(61, 0)).unwrap(),
            resolver().seed_for(60, &BlockContext::new(61, 0)).unwrap()
        );
    }

    #[test]
    fn narrower_window_applies() {
        let r = resolver().with_window(10);
        assert!(r.seed_for(60, &BlockContext::new(71, 0)).is_err());
    }
}
