use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of significant mask bits examined by the partition search.
///
/// With 6 bits at most 63 candidate bipartitions are scored, so systems with
/// more than seven elements are only partially searched.
pub const DEFAULT_PARTITION_MASK_BITS: u32 = 6;

/// Upper bound accepted by [`PhiConfig::validate`]; 2^20 candidates per call.
pub const MAX_PARTITION_MASK_BITS: u32 = 20;

const fn default_partition_mask_bits() -> u32 {
    DEFAULT_PARTITION_MASK_BITS
}

/// Engine configuration section.
///
/// # TOML
/// ```text
/// [engine]
/// partition-mask-bits = 6
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PhiConfig {
    /// Cap on the bipartition mask width (`min(2^(n-1), 2^bits)` candidates).
    #[serde(default = "default_partition_mask_bits")]
    pub partition_mask_bits: u32,
}

impl Default for PhiConfig {
    fn default() -> Self {
        Self {
            partition_mask_bits: default_partition_mask_bits(),
        }
    }
}

impl PhiConfig {
    pub fn sample() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), PhiConfigError> {
        if self.partition_mask_bits == 0 || self.partition_mask_bits > MAX_PARTITION_MASK_BITS {
            return Err(PhiConfigError::MaskBits {
                bits: self.partition_mask_bits,
                max: MAX_PARTITION_MASK_BITS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhiConfigError {
    #[error("partition mask bits must be within 1..={max}, got {bits}")]
    MaskBits { bits: u32, max: u32 },
}
