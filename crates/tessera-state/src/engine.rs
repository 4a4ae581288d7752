use std::sync::Arc;

use tessera_core::call::{Action, Call, Event, MintSelection, Receipt};
use tessera_core::config::MintConfig;
use tessera_core::epoch::{Epoch, LedgerHead};
use tessera_core::error::TesseraError;
use tessera_core::token::{birth_day, SupplyCounters, TokenRecord};
use tessera_core::types::{Address, BlockContext, TokenId, Wei};
use tessera_crypto::randomness::RandomnessResolver;
use tracing::{debug, info};

use crate::accountant::{reserve_allocations, split_proceeds, validate_mint};
use crate::db::{StateBatch, StateDb};
use crate::ledger::EpochLedger;
use crate::registry::TokenRegistry;

// ── Staged mutations ──────────────────────────────────────────────────────────

/// All state changes staged by a call before commit.
#[derive(Default)]
struct StagedMutations {
    head: Option<LedgerHead>,
    epochs: Vec<Epoch>,
    tokens: Vec<TokenRecord>,
    mint_counts: Vec<(Address, u32)>,
    approvals: Vec<(TokenId, Option<Address>)>,
    operators: Vec<(Address, Address, bool)>,
    payouts: Vec<(Address, Wei)>,
    counters: Option<SupplyCounters>,
    balance: Option<Wei>,
}

impl StagedMutations {
    fn stage_ledger(&mut self, ledger: EpochLedger) {
        let (head, epochs) = ledger.into_changes();
        self.head = Some(head);
        self.epochs = epochs;
    }
}

// ── StateEngine ───────────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Validates and applies calls to the persistent state database. Each
/// `apply` is all-or-nothing: every check runs before the first write, and a
/// rejected call leaves the database untouched.
pub struct StateEngine {
    pub db: Arc<StateDb>,
    resolver: Box<dyn RandomnessResolver + Send + Sync>,
    config: MintConfig,
}

impl StateEngine {
    /// Bind an engine to a deployed database. Fails with `NotDeployed` otherwise.
    pub fn new(
        db: Arc<StateDb>,
        resolver: Box<dyn RandomnessResolver + Send + Sync>,
    ) -> Result<Self, TesseraError> {
        let config = db.config()?;
        Ok(Self { db, resolver, config })
    }

    pub fn config(&self) -> &MintConfig {
        &self.config
    }

    /// Validate and apply a call executing in block `at`.
    pub fn apply(&self, call: &Call, at: &BlockContext) -> Result<Receipt, TesseraError> {
        // ── Block ordering ────────────────────────────────────────────────────
        if let Some(last) = self.db.last_block()? {
            if at.number < last {
                return Err(TesseraError::BlockRegression { last, got: at.number });
            }
        }

        let mut staged = StagedMutations::default();
        let mut receipt = Receipt::new(at.number);

        match &call.action {
            Action::Mint { selection, recipient, payment } => {
                self.apply_mint(call.from, selection, *recipient, *payment, at, &mut staged, &mut receipt)?;
            }
            Action::ResolveEpoch => {
                let mut ledger = EpochLedger::load(&self.db, self.config.reveal_delay)?;
                if let Some(resolved) = ledger.resolve_if_necessary(at, self.resolver.as_ref())? {
                    receipt.events.push(Event::NewEpoch {
                        epoch_id: resolved.epoch_id,
                        reveal_block: resolved.reveal_block,
                    });
                    staged.stage_ledger(ledger);
                }
            }
            Action::Burn { token_id } => {
                self.apply_burn(call.from, *token_id, &mut staged, &mut receipt)?;
            }
            Action::Approve { token_id, spender } => {
                let registry = TokenRegistry::new(&self.db);
                let record = registry.require_live(*token_id)?;
                if !registry.is_owner_or_operator(&record, &call.from)? {
                    return Err(TesseraError::Unauthorized);
                }
                staged.approvals.push((*token_id, *spender));
                receipt.events.push(Event::Approval {
                    owner: record.owner,
                    spender: *spender,
                    token_id: *token_id,
                });
            }
            Action::SetApprovalForAll { operator, approved } => {
                staged.operators.push((call.from, *operator, *approved));
                receipt.events.push(Event::ApprovalForAll {
                    owner: call.from,
                    operator: *operator,
                    approved: *approved,
                });
            }
            Action::Withdraw { amount } => {
                let owner = self.db.owner()?;
                if call.from != owner {
                    return Err(TesseraError::Unauthorized);
                }
                let have = self.db.contract_balance()?;
                if *amount > have {
                    return Err(TesseraError::InsufficientBalance { need: *amount, have });
                }
                staged.balance = Some(have - *amount);
                let paid = self.db.get_payout(&owner)?.saturating_add(*amount);
                staged.payouts.push((owner, paid));
                receipt.events.push(Event::Withdrawal { to: owner, amount: *amount });
            }
        }

        self.commit(staged, at)?;

        info!(
            from = %call.from,
            block = at.number,
            events = receipt.events.len(),
            "applied call"
        );
        Ok(receipt)
    }

    // ── Mint ─────────────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn apply_mint(
        &self,
        from: Address,
        selection: &MintSelection,
        recipient: Address,
        payment: Wei,
        at: &BlockContext,
        staged: &mut StagedMutations,
        receipt: &mut Receipt,
    ) -> Result<(), TesseraError> {
        let config = &self.config;
        let minted_by_caller = self.db.get_mint_count(&from)?;
        let quantity = validate_mint(config, selection, payment, minted_by_caller, |id| {
            self.db.token_exists(id)
        })?;

        // Reveal before committing, so one call can close the old epoch and
        // open the next.
        let mut ledger = EpochLedger::load(&self.db, config.reveal_delay)?;
        if let Some(resolved) = ledger.resolve_if_necessary(at, self.resolver.as_ref())? {
            receipt.events.push(Event::NewEpoch {
                epoch_id: resolved.epoch_id,
                reveal_block: resolved.reveal_block,
            });
        }
        let epoch_id = ledger.commit(at.number);
        staged.stage_ledger(ledger);

        let day = birth_day(self.db.deployed_at()?, at.timestamp);
        let mut counters = self.db.counters()?;
        let grants = reserve_allocations(config.reserve.as_ref(), counters.user_minted, quantity);

        let user_ids: Vec<TokenId> = match selection {
            MintSelection::Quantity(_) => (0..quantity).map(|_| next_id(&mut counters)).collect(),
            MintSelection::Ids(ids) => ids.clone(),
        };

        let mut mint = |id: TokenId, owner: Address, reserve: bool| {
            staged.tokens.push(TokenRecord {
                id,
                owner,
                birth_day: day,
                epoch_id,
                minted_at_block: at.number,
                burned: false,
                reserve,
            });
            receipt.minted.push(id);
            receipt.events.push(Event::Transfer { from: None, to: Some(owner), token_id: id });
        };

        for id in user_ids {
            mint(id, recipient, false);
        }
        for grant in &grants {
            let id = next_id(&mut counters);
            debug!(token_id = id, recipient = %grant.recipient, reason = ?grant.reason, "reserve grant");
            mint(id, grant.recipient, true);
        }

        counters.minted += u64::from(quantity) + grants.len() as u64;
        counters.user_minted += u64::from(quantity);
        staged.counters = Some(counters);
        staged.mint_counts.push((from, minted_by_caller + quantity));

        // ── Proceeds ──────────────────────────────────────────────────────────
        let split = split_proceeds(config.reserve.as_ref(), payment);
        if let Some(to) = split.recipient {
            if split.reserve_share > 0 {
                let paid = self.db.get_payout(&to)?.saturating_add(split.reserve_share);
                staged.payouts.push((to, paid));
            }
        }
        staged.balance = Some(self.db.contract_balance()?.saturating_add(split.retained));

        info!(
            from = %from,
            recipient = %recipient,
            quantity,
            reserve = grants.len(),
            epoch_id,
            "minted tokens"
        );
        Ok(())
    }

    // ── Burn ─────────────────────────────────────────────────────────────────

    fn apply_burn(
        &self,
        caller: Address,
        token_id: TokenId,
        staged: &mut StagedMutations,
        receipt: &mut Receipt,
    ) -> Result<(), TesseraError> {
        let registry = TokenRegistry::new(&self.db);
        let mut record = registry.require_live(token_id)?;
        if !registry.is_authorized(&record, &caller)? {
            return Err(TesseraError::Unauthorized);
        }

        record.burned = true;
        let owner = record.owner;
        staged.tokens.push(record);
        staged.approvals.push((token_id, None));

        let mut counters = self.db.counters()?;
        counters.burned += 1;
        staged.counters = Some(counters);

        receipt.events.push(Event::Transfer { from: Some(owner), to: None, token_id });
        info!(token_id, owner = %owner, "burned token");
        Ok(())
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Encode the staged changes and write them in one transaction.
    fn commit(&self, staged: StagedMutations, at: &BlockContext) -> Result<(), TesseraError> {
        let mut batch = StateBatch::new();
        for epoch in &staged.epochs {
            batch.put_epoch(epoch)?;
        }
        if let Some(head) = &staged.head {
            batch.put_head(head)?;
        }
        for token in &staged.tokens {
            batch.put_token(token)?;
        }
        for (who, count) in &staged.mint_counts {
            batch.put_mint_count(who, *count);
        }
        for (id, spender) in &staged.approvals {
            batch.put_approval(*id, spender.as_ref());
        }
        for (owner, operator, approved) in &staged.operators {
            batch.set_operator(owner, operator, *approved);
        }
        for (who, total) in &staged.payouts {
            batch.put_payout(who, *total);
        }
        if let Some(counters) = &staged.counters {
            batch.put_counters(counters)?;
        }
        if let Some(balance) = staged.balance {
            batch.put_contract_balance(balance);
        }
        batch.put_last_block(at.number);
        self.db.commit(&batch)
    }
}

fn next_id(counters: &mut SupplyCounters) -> TokenId {
    let id = counters.next_token_id;
    counters.next_token_id += 1;
    id
}

// ── Tests ─────────────────────────────────────────────────────────────────────
