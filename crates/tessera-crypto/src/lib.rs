pub mod chain;
pub mod hash;
pub mod randomness;

pub use chain::{BlockHashSource, SimulatedChain};
pub use hash::{address_from_label, blake3_hash, degraded_seed, seed_from_block_hash};
pub use randomness::{BlockHashResolver, RandomnessResolver, StaticResolver};
