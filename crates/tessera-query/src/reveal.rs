use serde::{Deserialize, Serialize};
use tessera_core::epoch::Epoch;
use tessera_core::token::TokenRecord;
use tessera_core::types::{BlockNumber, Day, EpochId, Seed, TokenId};

/// Everything the metadata renderer needs for one token.
///
/// `seed` is present only once the token's epoch is revealed; an unrevealed
/// token must render as a placeholder.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealInput {
    pub token_id: TokenId,
    pub birth_day: Day,
    pub epoch_id: EpochId,
    pub revealed: bool,
    pub seed: Option<Seed>,
}

impl RevealInput {
    pub fn new(token: &TokenRecord, epoch: Option<&Epoch>) -> Self {
        let (revealed, seed) = match epoch {
            Some(e) if e.revealed => (true, e.seed),
            _ => (false, None),
        };
        Self {
            token_id: token.id,
            birth_day: token.birth_day,
            epoch_id: token.epoch_id,
            revealed,
            seed,
        }
    }
}

/// The open epoch and how far it is from its reveal block.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingReveal {
    pub epoch_id: EpochId,
    pub reveal_block: BlockNumber,
    /// Zero once the epoch can be resolved.
    pub blocks_remaining: u64,
}

impl PendingReveal {
    pub fn new(epoch: &Epoch, current_block: BlockNumber) -> Self {
        Self {
            epoch_id: epoch.id,
            reveal_block: epoch.reveal_block,
            blocks_remaining: epoch.reveal_block.saturating_sub(current_block),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.blocks_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::types::Address;

    fn token() -> TokenRecord {
        TokenRecord {
            id: 3,
            owner: Address::from_bytes([1u8; 20]),
            birth_day: 2,
            epoch_id: 1,
            minted_at_block: 10,
            burned: false,
            reserve: false,
        }
    }

    #[test]
    fn unrevealed_epoch_never_leaks_seed() {
        let epoch = Epoch::open(1, 10, 50);
        let input = RevealInput::new(&token(), Some(&epoch));
        assert!(!input.revealed);
        assert_eq!(input.seed, None);
    }

    #[test]
    fn revealed_epoch_supplies_seed() {
        let mut epoch = Epoch::open(1, 10, 50);
        epoch.reveal(Seed([8u8; 32]), false).unwrap();
        let input = RevealInput::new(&token(), Some(&epoch));
        assert!(input.revealed);
        assert_eq!(input.seed, Some(Seed([8u8; 32])));
        assert_eq!((input.token_id, input.birth_day), (3, 2));
    }

    #[test]
    fn pending_countdown() {
        let epoch = Epoch::open(1, 10, 50);
        let p = PendingReveal::new(&epoch, 40);
        assert_eq!(p.blocks_remaining, 20);
        assert!(!p.is_ready());
        assert!(PendingReveal::new(&epoch, 300).is_ready());
    }
}
