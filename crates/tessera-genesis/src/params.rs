use serde::{Deserialize, Serialize};
use tessera_core::config::MintConfig;
use tessera_core::error::TesseraError;
use tessera_core::types::Address;

/// Everything fixed at deployment.
///
/// Usually loaded from a JSON file; `config` falls back to the paid
/// sequential edition when omitted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployParams {
    /// The only address allowed to withdraw retained proceeds.
    pub owner: Address,
    #[serde(default)]
    pub config: MintConfig,
}

impl DeployParams {
    pub fn new(owner: Address, config: MintConfig) -> Self {
        Self { owner, config }
    }

    pub fn from_json(json: &str) -> Result<Self, TesseraError> {
        serde_json::from_str(json).map_err(|e| TesseraError::Config(e.to_string()))
    }
}
