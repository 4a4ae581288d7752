//! A deterministic stand-in for the host chain.
//!
//! Blocks are sealed on demand by `mine`; each block's hash is
//! BLAKE3(salt ‖ number_le), so two chains with the same salt agree on every
//! hash while a fresh random salt makes hashes unknowable ahead of time.

use serde::{Deserialize, Serialize};
use tessera_core::types::{BlockContext, BlockNumber, Timestamp};

/// Anything that can report the hash of a block already sealed when the chain
/// head is at `head`.
///
/// `head` is the block the calling transaction executes in. [`SimulatedChain`]
/// seals that block before the call runs, so it answers for `number == head`.
/// An EVM host does not: `blockhash(block.number)` is zero there, so a binding
/// to a real chain must return `None` for the executing block. The reveal then
/// either degrades (resolved exactly at the reveal block) or waits one block.
pub trait BlockHashSource {
    fn block_hash(&self, number: BlockNumber, head: BlockNumber) -> Option<[u8; 32]>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulatedChain {
    salt: [u8; 32],
    height: BlockNumber,
    timestamp: Timestamp,
    block_time_secs: i64,
}

impl SimulatedChain {
    pub const DEFAULT_BLOCK_TIME_SECS: i64 = 12;

    pub fn new(salt: [u8; 32], height: BlockNumber, timestamp: Timestamp) -> Self {
        Self {
            salt,
            height,
            timestamp,
            block_time_secs: Self::DEFAULT_BLOCK_TIME_SECS,
        }
    }

    /// Chain with a fresh random salt.
    pub fn random(height: BlockNumber, timestamp: Timestamp) -> Self {
        Self::new(rand::random(), height, timestamp)
    }

    pub fn with_block_time(mut self, secs: i64) -> Self {
        self.block_time_secs = secs;
        self
    }

    pub fn height(&self) -> BlockNumber {
        self.height
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Context for a call included in the current head block.
    pub fn context(&self) -> BlockContext {
        BlockContext::new(self.height, self.timestamp)
    }

    /// Seal `blocks` new blocks.
    pub fn mine(&mut self, blocks: u64) -> BlockContext {
        self.height = self.height.saturating_add(blocks);
        self.timestamp = self
            .timestamp
            .saturating_add(self.block_time_secs.saturating_mul(blocks as i64));
        self.context()
    }

    /// Jump the clock forward by `secs` and seal one block at the new time.
    pub fn increase_time(&mut self, secs: i64) -> BlockContext {
        self.timestamp = self.timestamp.saturating_add(secs);
        self.height = self.height.saturating_add(1);
        self.context()
    }

    fn derive_hash(&self, number: BlockNumber) -> [u8; 32] {
        let mut h = blake3::Hasher::new();
        h.update(&self.salt);
        h.update(&number.to_le_bytes());
        *h.finalize().as_bytes()
    }
}

impl BlockHashSource for SimulatedChain {
    /// Includes the executing block `head` itself; see the trait docs.
    fn block_hash(&self, number: BlockNumber, head: BlockNumber) -> Option<[u8; 32]> {
        (number <= head).then(|| self.derive_hash(number))
    }
}
