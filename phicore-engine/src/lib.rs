//! Φ integration engine.
//!
//! The crate turns a [`SystemState`] (activation vector plus directed weight
//! matrix) into a [`PhiResult`]:
//!
//! 1. [`repertoire`] derives the cause/effect distributions,
//! 2. [`partition`] walks the bitmask-enumerated bipartitions and picks the
//!    minimum information partition,
//! 3. [`scorer`] folds both into the integrated-information score and Φ.
//!
//! Every computation is pure and total: ragged matrices read as "no edge" and
//! numeric floors keep NaN/∞ out of the output.
//!
//! # Quickstart
//! ```
//! use phicore_engine::{PhiEngine, SystemState};
//!
//! let state = SystemState::uniform(4, 0.6, 0.3, 0.9);
//! let result = PhiEngine::default().compute_phi(&state);
//! assert!(result.phi >= 0.0 && result.phi <= 15.0);
//! assert_eq!(result.consciousness_threshold, result.phi > 3.0);
//! ```

pub mod config;
pub mod partition;
pub mod repertoire;
pub mod scorer;
pub mod state;

pub use config::{PhiConfig, PhiConfigError};
pub use partition::{Bipartition, Bipartitions, PartitionInfo, PartitionSearch};
pub use repertoire::Repertoires;
pub use scorer::{compute_phi, mutual_information, scaled_phi, PhiEngine, PhiResult};
pub use state::SystemState;
