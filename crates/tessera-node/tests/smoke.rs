//! End-to-end smoke test for tessera-node.
//!
//! Drives the real binary through a deploy → mint → reveal → burn session
//! against one data directory and checks the JSON it prints.
//!
//! Run with:
//!   cargo test -p tessera-node --test smoke

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tessera_core::config::MintConfig;
use tessera_core::constants::{UNIT_PRICE_WEI, WEI_PER_ETHER};
use tessera_crypto::address_from_label;
use tessera_genesis::DeployParams;

const SALT: &str = "0707070707070707070707070707070707070707070707070707070707070707";

// ── Data dir lifecycle ────────────────────────────────────────────────────────

struct DataDirGuard {
    path: PathBuf,
}

impl DataDirGuard {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("tessera_e2e_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        Self { path }
    }
}

impl Drop for DataDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// ── CLI helpers ───────────────────────────────────────────────────────────────

fn node(dir: &DataDirGuard, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tessera-node"))
        .arg("--data-dir")
        .arg(&dir.path)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to spawn tessera-node")
}

/// Run a command that must succeed and parse its stdout.
fn ok(dir: &DataDirGuard, args: &[&str]) -> Value {
    let out = node(dir, args);
    assert!(
        out.status.success(),
        "tessera-node {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("parse CLI JSON")
}

fn fails(dir: &DataDirGuard, args: &[&str]) -> String {
    let out = node(dir, args);
    assert!(!out.status.success(), "tessera-node {args:?} unexpectedly succeeded");
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn minted(receipt: &Value) -> Vec<u64> {
    receipt["minted"]
        .as_array()
        .expect("minted list")
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect()
}

// ── Smoke tests ───────────────────────────────────────────────────────────────

#[test]
fn smoke_mint_reveal_burn() {
    let dir = DataDirGuard::new("mint_reveal_burn");

    // ── 1. Deploy ─────────────────────────────────────────────────────────────
    let deployed = ok(&dir, &["deploy", "--owner", "owner", "--salt", SALT]);
    assert_eq!(deployed["deployed"], true);
    assert_eq!(deployed["block"], 1);
    fails(&dir, &["deploy", "--salt", SALT]);

    // ── 2. First mint opens epoch 1 and triggers a reserve grant ─────────────
    let receipt = ok(&dir, &["mint", "--from", "alice", "--quantity", "1"]);
    assert_eq!(minted(&receipt), vec![1, 2, 3]);
    assert_eq!(receipt["block"], 2);
    let epoch = ok(&dir, &["epoch", "1"]);
    assert_eq!((epoch["committed"].as_bool(), epoch["revealed"].as_bool()), (Some(true), Some(false)));

    let input = ok(&dir, &["reveal-input", "1"]);
    assert_eq!(input["revealed"], false);
    assert!(input["seed"].is_null());

    // ── 3. Exact payment is enforced ─────────────────────────────────────────
    let short = (UNIT_PRICE_WEI - 1).to_string();
    let err = fails(&dir, &["mint", "--from", "bob", "--quantity", "1", "--value", &short]);
    assert!(err.contains("payment must be exactly"), "unexpected error: {err}");

    // ── 4. Advance past the reveal block and resolve ─────────────────────────
    ok(&dir, &["mine", "50"]);
    let receipt = ok(&dir, &["resolve-epoch"]);
    assert_eq!(receipt["events"][0]["NewEpoch"]["epoch_id"], 1);
    assert_eq!(receipt["events"][0]["NewEpoch"]["reveal_block"], 52);

    // Second resolve is a no-op.
    let receipt = ok(&dir, &["resolve-epoch"]);
    assert!(receipt["events"].as_array().unwrap().is_empty());

    let epoch = ok(&dir, &["epoch"]);
    assert_eq!(epoch["epoch_id"], 2);
    assert_eq!(epoch["committed"], false);

    let input = ok(&dir, &["reveal-input", "1"]);
    assert_eq!(input["revealed"], true);
    assert_eq!(input["seed"].as_str().map(str::len), Some(64));

    let token = ok(&dir, &["token", "1"]);
    assert_eq!(token["token"]["is_revealed"], true);
    assert_eq!(token["token"]["birth_day"], 1);

    // ── 5. Burn ──────────────────────────────────────────────────────────────
    fails(&dir, &["burn", "--from", "bob", "1"]);
    ok(&dir, &["burn", "--from", "alice", "1"]);
    let err = fails(&dir, &["burn", "--from", "alice", "1"]);
    assert!(err.contains("already burned"), "unexpected error: {err}");
    let token = ok(&dir, &["token", "1"]);
    assert!(token["token"]["owner"].is_null());
    assert!(token["summary"].as_str().unwrap().contains("owner: none | day 1"));

    let status = ok(&dir, &["status"]);
    assert_eq!(status["status"]["total_supply"], 2);
    assert_eq!(status["status"]["burned"], 1);
    assert!(status["pending_reveal"].is_null());
}

#[test]
fn smoke_proceeds_and_withdraw() {
    let dir = DataDirGuard::new("proceeds");
    ok(&dir, &["deploy", "--owner", "owner", "--salt", SALT]);
    ok(&dir, &["mint", "--from", "alice", "--quantity", "2"]);

    let status = ok(&dir, &["status"]);
    let retained = UNIT_PRICE_WEI * 2 * 8 / 10;
    assert_eq!(status["status"]["contract_balance"], retained.to_string());

    fails(&dir, &["withdraw", "--from", "alice"]);
    let receipt = ok(&dir, &["withdraw", "--from", "owner"]);
    assert_eq!(receipt["events"][0]["Withdrawal"]["amount"], retained.to_string());

    let status = ok(&dir, &["status"]);
    assert_eq!(status["status"]["contract_balance"], "0");
}

#[test]
fn smoke_amounts_above_u64() {
    let dir = DataDirGuard::new("large_amounts");
    std::fs::create_dir_all(&dir.path).unwrap();
    let price = 100 * WEI_PER_ETHER;
    let config = MintConfig { unit_price: price, ..MintConfig::default() };
    let params_path = dir.path.join("params.json");
    let params = DeployParams::new(address_from_label("owner"), config);
    std::fs::write(&params_path, serde_json::to_string(&params).unwrap()).unwrap();

    let deployed = ok(&dir, &["deploy", "--params", params_path.to_str().unwrap(), "--salt", SALT]);
    assert_eq!(deployed["config"]["unit_price"], price.to_string());

    let receipt = ok(&dir, &["mint", "--from", "alice", "--quantity", "1"]);
    assert_eq!(minted(&receipt), vec![1, 2, 3]);

    let retained = price * 8 / 10;
    assert!(retained > u64::MAX as u128);
    let status = ok(&dir, &["status"]);
    assert_eq!(status["status"]["contract_balance"], retained.to_string());
    assert_eq!(status["chain"]["block"], 2);

    let receipt = ok(&dir, &["withdraw", "--from", "owner"]);
    assert_eq!(receipt["events"][0]["Withdrawal"]["amount"], retained.to_string());

    let status = ok(&dir, &["status"]);
    assert_eq!(status["status"]["contract_balance"], "0");
    assert_eq!(status["chain"]["block"], 3);
}

#[test]
fn smoke_open_ids() {
    let dir = DataDirGuard::new("open_ids");
    ok(&dir, &["deploy", "--preset", "open-ids", "--salt", SALT]);
    let receipt = ok(&dir, &["mint", "--from", "alice", "--ids", "42,7"]);
    assert_eq!(minted(&receipt), vec![42, 7]);
    let err = fails(&dir, &["mint", "--from", "bob", "--ids", "7"]);
    assert!(err.contains("token already exists"), "unexpected error: {err}");

    let tokens = ok(&dir, &["tokens", "alice"]);
    assert_eq!(tokens["tokens"].as_array().unwrap().len(), 2);
}
