/// ─── Tessera Protocol Constants ─────────────────────────────────────────────
///
/// Defaults for a paid, sequentially numbered edition. Every value here can be
/// overridden per deployment through `MintConfig`.

use crate::types::{BlockNumber, EpochId, TokenId, Wei};

// ── Currency ─────────────────────────────────────────────────────────────────

/// 1 ether expressed in wei.
pub const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// Price of a single user mint (0.1 ether).
pub const UNIT_PRICE_WEI: Wei = WEI_PER_ETHER / 10;

// ── Commit-reveal ────────────────────────────────────────────────────────────

/// Blocks that must elapse between an epoch's commit block and its reveal.
pub const REVEAL_DELAY_BLOCKS: BlockNumber = 50;

/// How far back the host chain can look up a block hash.
pub const BLOCK_HASH_WINDOW: BlockNumber = 256;

/// First epoch id handed out by a fresh ledger.
pub const FIRST_EPOCH_ID: EpochId = 1;

// ── Mint limits ──────────────────────────────────────────────────────────────

/// Maximum tokens a single mint call may request.
pub const MAX_PER_TRANSACTION: u32 = 5;

/// Maximum tokens one caller may mint over the lifetime of the edition.
pub const MAX_MINTS_PER_ADDRESS: u32 = 5;

/// First id assigned under sequential allocation.
pub const FIRST_TOKEN_ID: TokenId = 1;

// ── Reserve ──────────────────────────────────────────────────────────────────

/// One reserve grant per this many user mints.
pub const RESERVE_INTERVAL: u64 = 5;

/// Share of every payment forwarded to the proceeds reserve (20%).
pub const RESERVE_SHARE_BPS: u32 = 2_000;

pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default reserve recipients. The second one also receives the proceeds share.
pub const DEFAULT_RESERVE_ADDRESS_A: [u8; 20] = [
    0x89, 0x5e, 0x58, 0x96, 0x88, 0x19, 0xe8, 0x21, 0x46, 0x58,
    0x57, 0xcd, 0xbe, 0x33, 0xb8, 0x20, 0x27, 0x52, 0x77, 0x47,
];
pub const DEFAULT_RESERVE_ADDRESS_B: [u8; 20] = [
    0x1e, 0x29, 0x71, 0x1a, 0xbb, 0xc2, 0xe3, 0x50, 0xe4, 0x7d,
    0x59, 0x63, 0xc5, 0xac, 0x54, 0x70, 0xb5, 0x9a, 0x1a, 0xa4,
];

// ── Calendar ─────────────────────────────────────────────────────────────────

pub const SECONDS_PER_DAY: i64 = 86_400;
