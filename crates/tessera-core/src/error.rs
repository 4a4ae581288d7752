use thiserror::Error;

use crate::types::{BlockNumber, EpochId, TokenId, Wei};

#[derive(Debug, Error)]
pub enum TesseraError {
    // ── Mint validation ──────────────────────────────────────────────────────
    #[error("invalid quantity: got {got}, allowed 1..={max}")]
    InvalidQuantity { got: usize, max: u32 },

    #[error("payment must be exactly {expected} wei, got {got}")]
    PaymentMismatch { expected: Wei, got: Wei },

    #[error("mint cap reached: {minted} of {cap} already minted, {requested} requested")]
    AddressCapExceeded { cap: u32, minted: u32, requested: u32 },

    #[error("token already exists: {0}")]
    DuplicateToken(TokenId),

    #[error("token ids start at 1, got {0}")]
    InvalidTokenId(TokenId),

    #[error("mint selection does not match the deployment's id allocation")]
    UnsupportedSelection,

    // ── Registry ─────────────────────────────────────────────────────────────
    #[error("token not found: {0}")]
    TokenNotFound(TokenId),

    #[error("token already burned: {0}")]
    TokenBurned(TokenId),

    #[error("caller is not the owner or an approved operator")]
    Unauthorized,

    #[error("insufficient contract balance: need {need} wei, have {have}")]
    InsufficientBalance { need: Wei, have: Wei },

    // ── Epochs / randomness ──────────────────────────────────────────────────
    #[error("block hash for reveal block {block} is unavailable")]
    RandomnessUnavailable { block: BlockNumber },

    #[error("epoch {0} is already revealed")]
    EpochAlreadyRevealed(EpochId),

    #[error("block number went backwards: last {last}, got {got}")]
    BlockRegression { last: BlockNumber, got: BlockNumber },

    // ── Deployment / configuration ───────────────────────────────────────────
    #[error("state database has not been deployed")]
    NotDeployed,

    #[error("state database is already deployed")]
    AlreadyDeployed,

    #[error("configuration error: {0}")]
    Config(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
