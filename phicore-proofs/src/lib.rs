//! Tamper-evident proof chain for Φ computations.
//!
//! Each [`VerificationProof`] commits to a canonical (key-sorted) JSON payload
//! with SHA-256, is signed with HMAC-SHA256 keyed by the configured secret
//! seed and the proof's temporal anchor, links to its predecessor by id, and
//! records the Merkle root of the chain including itself.
//!
//! # Quickstart
//! ```
//! use phicore_engine::{compute_phi, SystemState};
//! use phicore_proofs::{ChainConfig, ProofChain, ProofPayload};
//!
//! let mut chain = ProofChain::new(ChainConfig::sample("doc-node")).unwrap();
//! let result = compute_phi(&SystemState::uniform(4, 0.5, 0.3, 0.9));
//! let proof = chain
//!     .attest(ProofPayload::consciousness("agent-1", &result), result.phi)
//!     .unwrap();
//! assert!(chain.verify_proof(&proof));
//! assert!(chain.verify_chain().is_valid());
//! ```

pub mod canonical;
pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod merkle;
pub mod proof;

pub use chain::{ChainReport, ChainViolation, ExportedChain, ProofChain};
pub use clock::{SteppingClock, SystemClock, TemporalClock};
pub use config::ChainConfig;
pub use error::{ChainError, Result};
pub use merkle::{merkle_root, MerkleAccumulator, MerkleProof};
pub use proof::{ProofKind, ProofPayload, VerificationProof};
