//! tessera-query
//!
//! Read-only views over a deployed mint: token and epoch lookups, the
//! pending reveal, and the inputs handed to the metadata renderer.
//! All state transitions live in tessera-state's StateEngine.

pub mod query;
pub mod reveal;

pub use query::{StatusReport, TesseraQuery};
pub use reveal::{PendingReveal, RevealInput};
