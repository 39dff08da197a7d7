use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

pub const DEFAULT_SIGNATURE_HEX_LEN: usize = 32;
const MIN_SIGNATURE_HEX_LEN: usize = 8;
/// Full HMAC-SHA256 tag, hex encoded.
const MAX_SIGNATURE_HEX_LEN: usize = 64;

fn default_secret_seed() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    hex::encode(seed)
}

const fn default_signature_hex_len() -> usize {
    DEFAULT_SIGNATURE_HEX_LEN
}

/// Proof-chain configuration section. The secret seed keys every signature,
/// so rotating it only requires a config change.
///
/// # TOML
/// ```text
/// [chain]
/// node-id = "phicore-a"
/// secret-seed = "5f1c..."
/// signature-hex-len = 32
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    /// Identifier mixed into proof ids so separate verifiers never collide.
    pub node_id: String,
    /// Generated from the OS RNG when omitted.
    #[serde(default = "default_secret_seed")]
    pub secret_seed: String,
    /// Hex characters kept from the HMAC tag.
    #[serde(default = "default_signature_hex_len")]
    pub signature_hex_len: usize,
}

impl ChainConfig {
    /// Canonical sample helpful for docs/tests. Never deploy this seed.
    pub fn sample(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_owned(),
            secret_seed: "phicore-sample-seed-0000000000000000".into(),
            signature_hex_len: DEFAULT_SIGNATURE_HEX_LEN,
        }
    }

    pub fn with_secret_seed(mut self, seed: impl Into<String>) -> Self {
        self.secret_seed = seed.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(ChainError::InvalidConfig("node id must not be empty".into()));
        }
        if self.secret_seed.is_empty() {
            return Err(ChainError::InvalidConfig(
                "secret seed must not be empty".into(),
            ));
        }
        let len = self.signature_hex_len;
        if !(MIN_SIGNATURE_HEX_LEN..=MAX_SIGNATURE_HEX_LEN).contains(&len) || len % 2 != 0 {
            return Err(ChainError::InvalidConfig(format!(
                "signature length must be an even number within {MIN_SIGNATURE_HEX_LEN}..={MAX_SIGNATURE_HEX_LEN}, got {len}"
            )));
        }
        Ok(())
    }
}
