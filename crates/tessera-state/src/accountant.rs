//! Pure mint bookkeeping: validation, reserve grants and the proceeds split.
//!
//! Nothing here touches storage; the engine passes in the counts it read and
//! stages whatever these functions decide.

use std::collections::HashSet;

use tessera_core::call::MintSelection;
use tessera_core::config::{IdAllocation, MintConfig, ReserveConfig};
use tessera_core::constants::{BPS_DENOMINATOR, FIRST_TOKEN_ID};
use tessera_core::error::TesseraError;
use tessera_core::types::{Address, TokenId, Wei};

/// Validate a mint request and return the number of user tokens it creates.
///
/// Checks run in a fixed order and the first failure wins: selection kind,
/// quantity, exact payment, per-address cap, then the ids themselves (each
/// at least `FIRST_TOKEN_ID` and unused).
pub fn validate_mint<F>(
    config: &MintConfig,
    selection: &MintSelection,
    payment: Wei,
    minted_by_caller: u32,
    token_exists: F,
) -> Result<u32, TesseraError>
where
    F: Fn(TokenId) -> Result<bool, TesseraError>,
{
    let kind_matches = matches!(
        (selection, config.id_allocation),
        (MintSelection::Quantity(_), IdAllocation::Sequential)
            | (MintSelection::Ids(_), IdAllocation::CallerSupplied)
    );
    if !kind_matches {
        return Err(TesseraError::UnsupportedSelection);
    }

    let requested = selection.len();
    if requested == 0 || requested > config.max_per_transaction as usize {
        return Err(TesseraError::InvalidQuantity {
            got: requested,
            max: config.max_per_transaction,
        });
    }
    let quantity = requested as u32;

    let expected = config.unit_price.saturating_mul(Wei::from(quantity));
    if payment != expected {
        return Err(TesseraError::PaymentMismatch { expected, got: payment });
    }

    if let Some(cap) = config.max_mints_per_address {
        if minted_by_caller.saturating_add(quantity) > cap {
            return Err(TesseraError::AddressCapExceeded {
                cap,
                minted: minted_by_caller,
                requested: quantity,
            });
        }
    }

    if let MintSelection::Ids(ids) = selection {
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            if id < FIRST_TOKEN_ID {
                return Err(TesseraError::InvalidTokenId(id));
            }
            if !seen.insert(id) || token_exists(id)? {
                return Err(TesseraError::DuplicateToken(id));
            }
        }
    }

    Ok(quantity)
}

// ── Reserve grants ───────────────────────────────────────────────────────────

/// Why a reserve token was granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantReason {
    /// The user mint with this 0-based running index hit the interval.
    Interval { user_mint_index: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReserveGrant {
    pub recipient: Address,
    pub reason: GrantReason,
}

/// Reserve grants triggered by minting `quantity` user tokens when
/// `user_minted_before` user tokens already exist.
///
/// Every user mint whose running index is a multiple of the interval grants
/// one token to each reserve address, in address order.
pub fn reserve_allocations(
    reserve: Option<&ReserveConfig>,
    user_minted_before: u64,
    quantity: u32,
) -> Vec<ReserveGrant> {
    let Some(reserve) = reserve else {
        return Vec::new();
    };
    let end = user_minted_before.saturating_add(u64::from(quantity));
    (user_minted_before..end)
        .filter(|index| index % reserve.interval == 0)
        .flat_map(|index| {
            reserve.addresses.iter().map(move |&recipient| ReserveGrant {
                recipient,
                reason: GrantReason::Interval { user_mint_index: index },
            })
        })
        .collect()
}

// ── Proceeds ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProceedsSplit {
    /// Paid out to `recipient` as part of the mint.
    pub reserve_share: Wei,
    /// Kept in the contract balance until withdrawn.
    pub retained: Wei,
    pub recipient: Option<Address>,
}

/// Split a mint payment between the proceeds reserve and the contract.
pub fn split_proceeds(reserve: Option<&ReserveConfig>, payment: Wei) -> ProceedsSplit {
    let Some(reserve) = reserve else {
        return ProceedsSplit { reserve_share: 0, retained: payment, recipient: None };
    };
    let bps = Wei::from(reserve.share_bps);
    let denom = Wei::from(BPS_DENOMINATOR);
    // Split the multiplication so large payments cannot overflow.
    let share = (payment / denom) * bps + (payment % denom) * bps / denom;
    ProceedsSplit {
        reserve_share: share,
        retained: payment - share,
        recipient: Some(reserve.proceeds_address()),
    }
}
