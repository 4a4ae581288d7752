pub mod accountant;
pub mod db;
pub mod engine;
pub mod ledger;
pub mod registry;

pub use db::{StateBatch, StateDb};
pub use engine::StateEngine;
pub use ledger::EpochLedger;
pub use registry::TokenRegistry;
