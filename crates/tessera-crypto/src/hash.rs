use tessera_core::types::{Address, BlockNumber, EpochId, Seed};

const REVEAL_SEED_DOMAIN: &[u8] = b"tessera/reveal-seed";
const DEGRADED_SEED_DOMAIN: &[u8] = b"tessera/degraded-seed";
const ADDRESS_DOMAIN: &[u8] = b"tessera/address";

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Reveal seed: BLAKE3(domain ‖ block_hash ‖ reveal_block_le).
pub fn seed_from_block_hash(block_hash: &[u8; 32], reveal_block: BlockNumber) -> Seed {
    let mut h = blake3::Hasher::new();
    h.update(REVEAL_SEED_DOMAIN);
    h.update(block_hash);
    h.update(&reveal_block.to_le_bytes());
    Seed::from_bytes(*h.finalize().as_bytes())
}

/// Fallback seed used when the reveal block's hash is out of reach:
/// BLAKE3(domain ‖ epoch_id_le ‖ reveal_block_le ‖ current_block_le).
///
/// Deterministic and publicly computable; epochs revealed this way are
/// flagged `degraded`.
pub fn degraded_seed(epoch_id: EpochId, reveal_block: BlockNumber, current_block: BlockNumber) -> Seed {
    let mut h = blake3::Hasher::new();
    h.update(DEGRADED_SEED_DOMAIN);
    h.update(&epoch_id.to_le_bytes());
    h.update(&reveal_block.to_le_bytes());
    h.update(&current_block.to_le_bytes());
    Seed::from_bytes(*h.finalize().as_bytes())
}

/// Derive a stable address from a human label (dev accounts, fixtures).
pub fn address_from_label(label: &str) -> Address {
    let mut h = blake3::Hasher::new();
    h.update(ADDRESS_DOMAIN);
    h.update(label.as_bytes());
    let digest = h.finalize();
    let mut arr = [0u8; 20];
    arr.copy_from_slice(&digest.as_bytes()[..20]);
    Address::from_bytes(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_depends_on_hash_and_height() {
        let a = seed_from_block_hash(&[1u8; 32], 60);
        assert_eq!(a, seed_from_block_hash(&[1u8; 32], 60));
        assert_ne!(a, seed_from_block_hash(&[2u8; 32], 60));
        assert_ne!(a, seed_from_block_hash(&[1u8; 32], 61));
    }

    #[test]
    fn degraded_seed_differs_from_reveal_seed() {
        let d = degraded_seed(1, 60, 400);
        assert_eq!(d, degraded_seed(1, 60, 400));
        assert_ne!(d, degraded_seed(2, 60, 400));
        assert_ne!(d, seed_from_block_hash(&[0u8; 32], 60));
    }

    #[test]
    fn labelled_addresses_are_distinct() {
        assert_eq!(address_from_label("alice"), address_from_label("alice"));
        assert_ne!(address_from_label("alice"), address_from_label("bob"));
    }
}
