use serde::{Deserialize, Serialize};

use crate::constants::{
    BPS_DENOMINATOR, DEFAULT_RESERVE_ADDRESS_A, DEFAULT_RESERVE_ADDRESS_B, MAX_MINTS_PER_ADDRESS,
    MAX_PER_TRANSACTION, RESERVE_INTERVAL, RESERVE_SHARE_BPS, REVEAL_DELAY_BLOCKS,
    UNIT_PRICE_WEI,
};
use crate::error::TesseraError;
use crate::types::{Address, BlockNumber, Wei};

/// How user token ids are chosen.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdAllocation {
    /// Ids are handed out in order starting at `FIRST_TOKEN_ID`.
    Sequential,
    /// The caller names the ids; each must be unused.
    CallerSupplied,
}

/// Automatic grants to fixed reserve recipients.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReserveConfig {
    /// Each grant mints one token to each address, in order.
    pub addresses: [Address; 2],
    /// One grant per `interval` user mints.
    pub interval: u64,
    /// Share of each payment (basis points) forwarded to `addresses[1]`.
    pub share_bps: u32,
}

impl ReserveConfig {
    /// Recipient of the proceeds share.
    pub fn proceeds_address(&self) -> Address {
        self.addresses[1]
    }
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            addresses: [
                Address::from_bytes(DEFAULT_RESERVE_ADDRESS_A),
                Address::from_bytes(DEFAULT_RESERVE_ADDRESS_B),
            ],
            interval: RESERVE_INTERVAL,
            share_bps: RESERVE_SHARE_BPS,
        }
    }
}

/// Per-deployment mint parameters. Fixed at deployment and stored in `meta`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintConfig {
    pub reveal_delay: BlockNumber,
    pub max_per_transaction: u32,
    /// `None` disables the lifetime per-address cap.
    pub max_mints_per_address: Option<u32>,
    #[serde(with = "crate::types::wei")]
    pub unit_price: Wei,
    pub id_allocation: IdAllocation,
    pub reserve: Option<ReserveConfig>,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            reveal_delay: REVEAL_DELAY_BLOCKS,
            max_per_transaction: MAX_PER_TRANSACTION,
            max_mints_per_address: Some(MAX_MINTS_PER_ADDRESS),
            unit_price: UNIT_PRICE_WEI,
            id_allocation: IdAllocation::Sequential,
            reserve: Some(ReserveConfig::default()),
        }
    }
}

impl MintConfig {
    /// Free edition where callers pick their ids; no reserve, no payment.
    pub fn open_ids() -> Self {
        Self {
            max_mints_per_address: None,
            unit_price: 0,
            id_allocation: IdAllocation::CallerSupplied,
            reserve: None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TesseraError> {
        if self.reveal_delay == 0 {
            return Err(TesseraError::Config("reveal_delay must be at least one block".into()));
        }
        if self.max_per_transaction == 0 {
            return Err(TesseraError::Config("max_per_transaction must be positive".into()));
        }
        if self.max_mints_per_address == Some(0) {
            return Err(TesseraError::Config("max_mints_per_address must be positive".into()));
        }
        if let Some(r) = &self.reserve {
            if r.interval == 0 {
                return Err(TesseraError::Config("reserve interval must be positive".into()));
            }
            if r.share_bps > BPS_DENOMINATOR {
                return Err(TesseraError::Config(format!(
                    "reserve share {} bps exceeds {}",
                    r.share_bps, BPS_DENOMINATOR
                )));
            }
            if self.id_allocation == IdAllocation::CallerSupplied {
                return Err(TesseraError::Config(
                    "reserve grants require sequential id allocation".into(),
                ));
            }
        }
        Ok(())
    }
}
