use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::Transactional;
use tessera_core::config::MintConfig;
use tessera_core::epoch::{Epoch, LedgerHead};
use tessera_core::error::TesseraError;
use tessera_core::token::{SupplyCounters, TokenRecord};
use tessera_core::types::{Address, BlockNumber, EpochId, Timestamp, TokenId, Wei};

const META_HEAD: &str = "head";
const META_COUNTERS: &str = "counters";
const META_CONFIG: &str = "config";
const META_OWNER: &str = "owner";
const META_DEPLOYED_AT: &str = "deployed_at";
const META_LAST_BLOCK: &str = "last_block";
const META_BALANCE: &str = "contract_balance";

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   epochs         EpochId BE bytes          → bincode(Epoch)
///   tokens         TokenId BE bytes          → bincode(TokenRecord)
///   mint_counts    Address bytes             → u32 LE
///   approvals      TokenId BE bytes          → Address bytes
///   operators      owner ‖ operator bytes    → [] (membership set)
///   payouts        Address bytes             → u128 LE (wei paid out)
///   meta           utf8 key bytes            → raw bytes
pub struct StateDb {
    _db: sled::Db,
    epochs: sled::Tree,
    tokens: sled::Tree,
    mint_counts: sled::Tree,
    approvals: sled::Tree,
    operators: sled::Tree,
    payouts: sled::Tree,
    meta: sled::Tree,
}

fn storage(e: sled::Error) -> TesseraError {
    TesseraError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TesseraError> {
    bincode::serialize(value).map_err(|e| TesseraError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TesseraError> {
    bincode::deserialize(bytes).map_err(|e| TesseraError::Serialization(e.to_string()))
}

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N], TesseraError> {
    bytes
        .try_into()
        .map_err(|_| TesseraError::Serialization(format!("{what}: expected {N} bytes, got {}", bytes.len())))
}

fn operator_key(owner: &Address, operator: &Address) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..20].copy_from_slice(owner.as_bytes());
    key[20..].copy_from_slice(operator.as_bytes());
    key
}

// ── StateBatch ───────────────────────────────────────────────────────────────

/// Encoded writes for one call, applied by [`StateDb::commit`] in a single
/// multi-tree transaction. Values are encoded as they are staged, so nothing
/// can fail between the first and the last write.
#[derive(Default)]
pub struct StateBatch {
    epochs: sled::Batch,
    tokens: sled::Batch,
    mint_counts: sled::Batch,
    approvals: sled::Batch,
    operators: sled::Batch,
    payouts: sled::Batch,
    meta: sled::Batch,
}

impl StateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_epoch(&mut self, epoch: &Epoch) -> Result<(), TesseraError> {
        self.epochs.insert(&epoch.id.to_be_bytes()[..], encode(epoch)?);
        Ok(())
    }

    pub fn put_token(&mut self, token: &TokenRecord) -> Result<(), TesseraError> {
        self.tokens.insert(&token.id.to_be_bytes()[..], encode(token)?);
        Ok(())
    }

    pub fn put_mint_count(&mut self, who: &Address, count: u32) {
        self.mint_counts.insert(&who.as_bytes()[..], &count.to_le_bytes()[..]);
    }

    pub fn put_approval(&mut self, token_id: TokenId, spender: Option<&Address>) {
        let key = token_id.to_be_bytes();
        match spender {
            Some(a) => self.approvals.insert(&key[..], &a.as_bytes()[..]),
            None => self.approvals.remove(&key[..]),
        }
    }

    pub fn set_operator(&mut self, owner: &Address, operator: &Address, approved: bool) {
        let key = operator_key(owner, operator);
        if approved {
            self.operators.insert(&key[..], &b""[..]);
        } else {
            self.operators.remove(&key[..]);
        }
    }

    pub fn put_payout(&mut self, who: &Address, total: Wei) {
        self.payouts.insert(&who.as_bytes()[..], &total.to_le_bytes()[..]);
    }

    pub fn put_head(&mut self, head: &LedgerHead) -> Result<(), TesseraError> {
        self.meta.insert(META_HEAD.as_bytes(), encode(head)?);
        Ok(())
    }

    pub fn put_counters(&mut self, counters: &SupplyCounters) -> Result<(), TesseraError> {
        self.meta.insert(META_COUNTERS.as_bytes(), encode(counters)?);
        Ok(())
    }

    pub fn put_contract_balance(&mut self, balance: Wei) {
        self.meta.insert(META_BALANCE.as_bytes(), &balance.to_le_bytes()[..]);
    }

    pub fn put_last_block(&mut self, block: BlockNumber) {
        self.meta.insert(META_LAST_BLOCK.as_bytes(), &block.to_le_bytes()[..]);
    }
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TesseraError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop.
    pub fn temporary() -> Result<Self, TesseraError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, TesseraError> {
        let epochs      = db.open_tree("epochs").map_err(storage)?;
        let tokens      = db.open_tree("tokens").map_err(storage)?;
        let mint_counts = db.open_tree("mint_counts").map_err(storage)?;
        let approvals   = db.open_tree("approvals").map_err(storage)?;
        let operators   = db.open_tree("operators").map_err(storage)?;
        let payouts     = db.open_tree("payouts").map_err(storage)?;
        let meta        = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, epochs, tokens, mint_counts, approvals, operators, payouts, meta })
    }

    // ── Epochs ───────────────────────────────────────────────────────────────

    pub fn get_epoch(&self, id: EpochId) -> Result<Option<Epoch>, TesseraError> {
        match self.epochs.get(id.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_epoch(&self, epoch: &Epoch) -> Result<(), TesseraError> {
        self.epochs
            .insert(epoch.id.to_be_bytes(), encode(epoch)?)
            .map_err(storage)?;
        Ok(())
    }

    /// All committed epochs in id order.
    pub fn iter_epochs(&self) -> Result<Vec<Epoch>, TesseraError> {
        let mut out = Vec::new();
        for item in self.epochs.iter() {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Tokens ───────────────────────────────────────────────────────────────

    pub fn get_token(&self, id: TokenId) -> Result<Option<TokenRecord>, TesseraError> {
        match self.tokens.get(id.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_token(&self, token: &TokenRecord) -> Result<(), TesseraError> {
        self.tokens
            .insert(token.id.to_be_bytes(), encode(token)?)
            .map_err(storage)?;
        Ok(())
    }

    /// True for any id ever minted, burned or not.
    pub fn token_exists(&self, id: TokenId) -> Result<bool, TesseraError> {
        self.tokens.contains_key(id.to_be_bytes()).map_err(storage)
    }

    /// All token records in id order.
    pub fn iter_tokens(&self) -> Result<Vec<TokenRecord>, TesseraError> {
        let mut out = Vec::new();
        for item in self.tokens.iter() {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Mint counts ──────────────────────────────────────────────────────────

    pub fn get_mint_count(&self, who: &Address) -> Result<u32, TesseraError> {
        match self.mint_counts.get(who.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(u32::from_le_bytes(fixed(&bytes, "mint count")?)),
            None => Ok(0),
        }
    }

    pub fn put_mint_count(&self, who: &Address, count: u32) -> Result<(), TesseraError> {
        self.mint_counts
            .insert(who.as_bytes(), &count.to_le_bytes())
            .map_err(storage)?;
        Ok(())
    }

    // ── Approvals ────────────────────────────────────────────────────────────

    pub fn get_approval(&self, token_id: TokenId) -> Result<Option<Address>, TesseraError> {
        match self.approvals.get(token_id.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(Address::from_bytes(fixed(&bytes, "approval")?))),
            None => Ok(None),
        }
    }

    /// `None` clears the approval.
    pub fn put_approval(&self, token_id: TokenId, spender: Option<&Address>) -> Result<(), TesseraError> {
        match spender {
            Some(a) => {
                self.approvals
                    .insert(token_id.to_be_bytes(), a.as_bytes())
                    .map_err(storage)?;
            }
            None => {
                self.approvals.remove(token_id.to_be_bytes()).map_err(storage)?;
            }
        }
        Ok(())
    }

    // ── Operators ────────────────────────────────────────────────────────────

    pub fn is_operator(&self, owner: &Address, operator: &Address) -> Result<bool, TesseraError> {
        self.operators
            .contains_key(operator_key(owner, operator))
            .map_err(storage)
    }

    pub fn set_operator(&self, owner: &Address, operator: &Address, approved: bool) -> Result<(), TesseraError> {
        let key = operator_key(owner, operator);
        if approved {
            self.operators.insert(key, b"".as_ref()).map_err(storage)?;
        } else {
            self.operators.remove(key).map_err(storage)?;
        }
        Ok(())
    }

    // ── Payouts ──────────────────────────────────────────────────────────────

    /// Total wei paid out of the contract to `who` (reserve share, withdrawals).
    pub fn get_payout(&self, who: &Address) -> Result<Wei, TesseraError> {
        match self.payouts.get(who.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Wei::from_le_bytes(fixed(&bytes, "payout")?)),
            None => Ok(0),
        }
    }

    pub fn put_payout(&self, who: &Address, total: Wei) -> Result<(), TesseraError> {
        self.payouts
            .insert(who.as_bytes(), &total.to_le_bytes())
            .map_err(storage)?;
        Ok(())
    }

    // ── Ledger head / counters ───────────────────────────────────────────────

    pub fn head(&self) -> Result<LedgerHead, TesseraError> {
        match self.get_meta(META_HEAD)? {
            Some(bytes) => decode(&bytes),
            None => Ok(LedgerHead::default()),
        }
    }

    pub fn put_head(&self, head: &LedgerHead) -> Result<(), TesseraError> {
        self.put_meta(META_HEAD, &encode(head)?)
    }

    pub fn counters(&self) -> Result<SupplyCounters, TesseraError> {
        match self.get_meta(META_COUNTERS)? {
            Some(bytes) => decode(&bytes),
            None => Ok(SupplyCounters::default()),
        }
    }

    pub fn put_counters(&self, counters: &SupplyCounters) -> Result<(), TesseraError> {
        self.put_meta(META_COUNTERS, &encode(counters)?)
    }

    pub fn contract_balance(&self) -> Result<Wei, TesseraError> {
        match self.get_meta(META_BALANCE)? {
            Some(bytes) => Ok(Wei::from_le_bytes(fixed(&bytes, "contract balance")?)),
            None => Ok(0),
        }
    }

    pub fn put_contract_balance(&self, balance: Wei) -> Result<(), TesseraError> {
        self.put_meta(META_BALANCE, &balance.to_le_bytes())
    }

    pub fn last_block(&self) -> Result<Option<BlockNumber>, TesseraError> {
        match self.get_meta(META_LAST_BLOCK)? {
            Some(bytes) => Ok(Some(BlockNumber::from_le_bytes(fixed(&bytes, "last block")?))),
            None => Ok(None),
        }
    }

    pub fn put_last_block(&self, block: BlockNumber) -> Result<(), TesseraError> {
        self.put_meta(META_LAST_BLOCK, &block.to_le_bytes())
    }

    // ── Deployment ───────────────────────────────────────────────────────────

    pub fn is_deployed(&self) -> Result<bool, TesseraError> {
        self.meta.contains_key(META_CONFIG).map_err(storage)
    }

    pub fn config(&self) -> Result<MintConfig, TesseraError> {
        let bytes = self.get_meta(META_CONFIG)?.ok_or(TesseraError::NotDeployed)?;
        decode(&bytes)
    }

    pub fn put_config(&self, config: &MintConfig) -> Result<(), TesseraError> {
        self.put_meta(META_CONFIG, &encode(config)?)
    }

    /// Deployment owner: the only caller allowed to withdraw proceeds.
    pub fn owner(&self) -> Result<Address, TesseraError> {
        let bytes = self.get_meta(META_OWNER)?.ok_or(TesseraError::NotDeployed)?;
        Ok(Address::from_bytes(fixed(&bytes, "owner")?))
    }

    pub fn put_owner(&self, owner: &Address) -> Result<(), TesseraError> {
        self.put_meta(META_OWNER, owner.as_bytes())
    }

    pub fn deployed_at(&self) -> Result<Timestamp, TesseraError> {
        let bytes = self.get_meta(META_DEPLOYED_AT)?.ok_or(TesseraError::NotDeployed)?;
        Ok(Timestamp::from_le_bytes(fixed(&bytes, "deployed_at")?))
    }

    pub fn put_deployed_at(&self, at: Timestamp) -> Result<(), TesseraError> {
        self.put_meta(META_DEPLOYED_AT, &at.to_le_bytes())
    }

    // ── Batched commit ───────────────────────────────────────────────────────

    /// Apply every write in `batch` or none of them.
    pub fn commit(&self, batch: &StateBatch) -> Result<(), TesseraError> {
        let trees = (
            &self.epochs,
            &self.tokens,
            &self.mint_counts,
            &self.approvals,
            &self.operators,
            &self.payouts,
            &self.meta,
        );
        trees
            .transaction(
                |(epochs, tokens, mint_counts, approvals, operators, payouts, meta)| -> ConflictableTransactionResult<(), ()> {
                    epochs.apply_batch(&batch.epochs)?;
                    tokens.apply_batch(&batch.tokens)?;
                    mint_counts.apply_batch(&batch.mint_counts)?;
                    approvals.apply_batch(&batch.approvals)?;
                    operators.apply_batch(&batch.operators)?;
                    payouts.apply_batch(&batch.payouts)?;
                    meta.apply_batch(&batch.meta)?;
                    Ok(())
                },
            )
            .map_err(|e| match e {
                TransactionError::Abort(()) => TesseraError::Storage("state commit aborted".into()),
                TransactionError::Storage(e) => storage(e),
            })
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), TesseraError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, TesseraError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), TesseraError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn fresh_db_defaults() {
        let db = StateDb::temporary().unwrap();
        assert!(!db.is_deployed().unwrap());
        assert!(matches!(db.config(), Err(TesseraError::NotDeployed)));
        assert_eq!(db.head().unwrap(), LedgerHead::default());
        assert_eq!(db.counters().unwrap(), SupplyCounters::default());
        assert_eq!(db.contract_balance().unwrap(), 0);
        assert_eq!(db.last_block().unwrap(), None);
        assert_eq!(db.get_mint_count(&addr(1)).unwrap(), 0);
    }

    #[test]
    fn epochs_iterate_in_id_order() {
        let db = StateDb::temporary().unwrap();
        for id in [3u64, 1, 256, 2] {
            db.put_epoch(&Epoch::open(id, id * 10, 50)).unwrap();
        }
        let ids: Vec<_> = db.iter_epochs().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 256]);
    }

    #[test]
    fn approvals_and_operators_toggle() {
        let db = StateDb::temporary().unwrap();
        db.put_approval(7, Some(&addr(2))).unwrap();
        assert_eq!(db.get_approval(7).unwrap(), Some(addr(2)));
        db.put_approval(7, None).unwrap();
        assert_eq!(db.get_approval(7).unwrap(), None);

        db.set_operator(&addr(1), &addr(2), true).unwrap();
        assert!(db.is_operator(&addr(1), &addr(2)).unwrap());
        assert!(!db.is_operator(&addr(2), &addr(1)).unwrap());
        db.set_operator(&addr(1), &addr(2), false).unwrap();
        assert!(!db.is_operator(&addr(1), &addr(2)).unwrap());
    }

    #[test]
    fn batch_lands_across_trees_on_commit() {
        let db = StateDb::temporary().unwrap();
        db.put_approval(5, Some(&addr(3))).unwrap();

        let mut batch = StateBatch::new();
        batch.put_epoch(&Epoch::open(1, 10, 50)).unwrap();
        batch.put_head(&LedgerHead { last_epoch_id: 1, open_epoch: Some(1) }).unwrap();
        batch.put_mint_count(&addr(1), 2);
        batch.put_approval(5, None);
        batch.set_operator(&addr(1), &addr(2), true);
        batch.put_payout(&addr(2), 99);
        batch.put_contract_balance(400);
        batch.put_last_block(10);

        // Staged writes are invisible until committed.
        assert!(db.get_epoch(1).unwrap().is_none());
        assert_eq!(db.get_approval(5).unwrap(), Some(addr(3)));
        assert_eq!(db.last_block().unwrap(), None);

        db.commit(&batch).unwrap();
        assert!(db.get_epoch(1).unwrap().is_some());
        assert_eq!(db.head().unwrap().open_epoch, Some(1));
        assert_eq!(db.get_mint_count(&addr(1)).unwrap(), 2);
        assert_eq!(db.get_approval(5).unwrap(), None);
        assert!(db.is_operator(&addr(1), &addr(2)).unwrap());
        assert_eq!(db.get_payout(&addr(2)).unwrap(), 99);
        assert_eq!(db.contract_balance().unwrap(), 400);
        assert_eq!(db.last_block().unwrap(), Some(10));
    }

    #[test]
    fn reopen_preserves_state() {
        let dir = std::env::temp_dir().join("tessera_db_test_reopen");
        let _ = std::fs::remove_dir_all(&dir);
        {
            let db = StateDb::open(&dir).unwrap();
            db.put_mint_count(&addr(9), 4).unwrap();
            db.put_payout(&addr(9), 42).unwrap();
            db.flush().unwrap();
        }
        let db = StateDb::open(&dir).unwrap();
        assert_eq!(db.get_mint_count(&addr(9)).unwrap(), 4);
        assert_eq!(db.get_payout(&addr(9)).unwrap(), 42);
        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
