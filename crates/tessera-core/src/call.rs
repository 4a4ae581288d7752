use serde::{Deserialize, Serialize};

use crate::types::{Address, BlockNumber, EpochId, TokenId, Wei};

// ── MintSelection ─────────────────────────────────────────────────────────────

/// What a mint call asks for: a count under sequential allocation, or explicit
/// ids when the deployment lets callers choose.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MintSelection {
    Quantity(u32),
    Ids(Vec<TokenId>),
}

impl MintSelection {
    /// Number of user tokens requested.
    pub fn len(&self) -> usize {
        match self {
            MintSelection::Quantity(q) => *q as usize,
            MintSelection::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

/// Every state-changing operation the engine accepts is one of these variants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    /// Mint user tokens to `recipient`, paying `payment` wei.
    /// Resolves an eligible epoch before committing the new tokens.
    Mint {
        selection: MintSelection,
        recipient: Address,
        #[serde(with = "crate::types::wei")]
        payment: Wei,
    },

    /// Reveal the open epoch if its delay has elapsed. No-op otherwise.
    ResolveEpoch,

    /// Permanently destroy a token. Owner, approved address or operator only.
    Burn { token_id: TokenId },

    /// Approve `spender` for one token (`None` clears the approval).
    Approve {
        token_id: TokenId,
        spender: Option<Address>,
    },

    /// Grant or revoke `operator` rights over all of the caller's tokens.
    SetApprovalForAll { operator: Address, approved: bool },

    /// Move retained proceeds to the deployment owner.
    Withdraw {
        #[serde(with = "crate::types::wei")]
        amount: Wei,
    },
}

/// A call submitted to the engine: who sends it and what it does.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Call {
    pub from: Address,
    pub action: Action,
}

impl Call {
    pub fn new(from: Address, action: Action) -> Self {
        Self { from, action }
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Notifications emitted by an applied call, in emission order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    /// Ownership change. `from == None` is a mint, `to == None` a burn.
    Transfer {
        from: Option<Address>,
        to: Option<Address>,
        token_id: TokenId,
    },
    NewEpoch {
        epoch_id: EpochId,
        reveal_block: BlockNumber,
    },
    Approval {
        owner: Address,
        spender: Option<Address>,
        token_id: TokenId,
    },
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
    Withdrawal {
        to: Address,
        #[serde(with = "crate::types::wei")]
        amount: Wei,
    },
}

/// Result of a successfully applied call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub block: BlockNumber,
    /// Every token created by the call, user tokens first, then reserve grants.
    pub minted: Vec<TokenId>,
    pub events: Vec<Event>,
}

impl Receipt {
    pub fn new(block: BlockNumber) -> Self {
        Self { block, ..Default::default() }
    }

    /// The `NewEpoch` notification, if the call fired one.
    pub fn new_epoch(&self) -> Option<(EpochId, BlockNumber)> {
        self.events.iter().find_map(|e| match e {
            Event::NewEpoch { epoch_id, reveal_block } => Some((*epoch_id, *reveal_block)),
            _ => None,
        })
    }

    pub fn transfers(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Transfer { .. }))
    }
}
