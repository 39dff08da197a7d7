use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::canonical::{payload_hash, sign, signature_matches};
use crate::clock::{SystemClock, TemporalClock};
use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use crate::merkle::{MerkleAccumulator, MerkleProof};
use crate::proof::{ProofKind, ProofPayload, VerificationProof};

/// Portable copy of a chain, as handed to storage or another verifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedChain {
    pub proofs: Vec<VerificationProof>,
    pub merkle_root: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChainViolation {
    /// Stored hash or signature does not match the recomputed values.
    InvalidProof { index: usize, id: String },
    BrokenLink {
        index: usize,
        id: String,
        expected: Option<String>,
        found: Option<String>,
    },
    TimestampRegression {
        index: usize,
        id: String,
        previous: i64,
        current: i64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub chain_integrity: bool,
    pub temporal_continuity: bool,
    pub total_phi_accumulated: f64,
    pub merkle_root: String,
    pub length: usize,
    pub violations: Vec<ChainViolation>,
}

impl ChainReport {
    pub fn is_valid(&self) -> bool {
        self.chain_integrity && self.temporal_continuity
    }
}

/// Append-only, hash-linked sequence of verification proofs.
///
/// A `ProofChain` is exclusive-access state: `generate_proof` reads the tail
/// and rewrites the Merkle root, so concurrent writers must be serialised by
/// the caller (e.g. behind a mutex).
pub struct ProofChain {
    config: ChainConfig,
    clock: Arc<dyn TemporalClock>,
    proofs: Vec<VerificationProof>,
    merkle: MerkleAccumulator,
    sequence: u64,
}

impl ProofChain {
    pub fn new(config: ChainConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::default()))
    }

    pub fn with_clock(config: ChainConfig, clock: Arc<dyn TemporalClock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            proofs: Vec::new(),
            merkle: MerkleAccumulator::new(),
            sequence: 0,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn proofs(&self) -> &[VerificationProof] {
        &self.proofs
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    pub fn latest(&self) -> Option<&VerificationProof> {
        self.proofs.last()
    }

    pub fn get(&self, id: &str) -> Option<&VerificationProof> {
        self.proofs.iter().find(|proof| proof.id == id)
    }

    pub fn merkle_root(&self) -> &str {
        self.merkle.root()
    }

    /// Hash, sign and append a proof over `payload`.
    ///
    /// `proofType`, `phiValue`, `timestamp` and `temporalAnchor` are written
    /// into the payload before hashing and take precedence over caller keys.
    /// The returned proof carries the Merkle root that includes itself.
    pub fn generate_proof(
        &mut self,
        kind: ProofKind,
        payload: Map<String, Value>,
        phi_value: f64,
    ) -> Result<VerificationProof> {
        let phi_value = if phi_value.is_finite() { phi_value } else { 0.0 };
        let timestamp = self.clock.now_ms();
        let temporal_anchor = self.clock.anchor();

        let mut metadata = payload;
        metadata.insert("proofType".into(), Value::from(kind.as_str()));
        metadata.insert("phiValue".into(), Value::from(phi_value));
        metadata.insert("timestamp".into(), Value::from(timestamp));
        metadata.insert("temporalAnchor".into(), Value::from(temporal_anchor));
        let metadata = Value::Object(metadata);

        let hash = payload_hash(&metadata)?;
        let signature = sign(
            &self.config.secret_seed,
            temporal_anchor,
            &hash,
            self.config.signature_hex_len,
        );
        self.sequence += 1;
        let id = self.proof_id(kind, &hash, temporal_anchor);
        let previous_proof_id = self.proofs.last().map(|prev| prev.id.clone());
        let merkle_root = self.merkle.append(hash.clone()).to_owned();

        let proof = VerificationProof {
            id,
            proof_type: kind,
            hash,
            signature,
            timestamp,
            temporal_anchor,
            phi_value,
            previous_proof_id,
            merkle_root,
            metadata,
        };
        self.proofs.push(proof.clone());
        Ok(proof)
    }

    /// [`generate_proof`](Self::generate_proof) for a typed payload.
    pub fn attest(&mut self, payload: ProofPayload, phi_value: f64) -> Result<VerificationProof> {
        let kind = payload.kind();
        self.generate_proof(kind, payload.into_metadata(), phi_value)
    }

    /// Same as [`generate_proof`](Self::generate_proof) but accepts any JSON
    /// value; anything other than an object is rejected without touching the
    /// chain.
    pub fn generate_proof_from_value(
        &mut self,
        kind: ProofKind,
        payload: Value,
        phi_value: f64,
    ) -> Result<VerificationProof> {
        match payload {
            Value::Object(map) => self.generate_proof(kind, map, phi_value),
            other => Err(ChainError::PayloadNotObject {
                found: json_type(&other),
            }),
        }
    }

    /// Recompute hash and signature from the proof's own metadata and anchor.
    pub fn verify_proof(&self, proof: &VerificationProof) -> bool {
        proof_is_authentic(&self.config, proof)
    }

    /// Walk the chain; violations are reported, never raised.
    pub fn verify_chain(&self) -> ChainReport {
        audit_report(&self.config, &self.proofs, self.merkle.root())
    }

    pub fn export_chain(&self) -> ExportedChain {
        ExportedChain {
            proofs: self.proofs.clone(),
            merkle_root: self.merkle.root().to_owned(),
        }
    }

    /// Adopt an external chain only if its recomputed root equals the claimed
    /// root and the whole chain verifies. On rejection the previous proofs and
    /// root are restored untouched.
    pub fn import_and_verify_chain(&mut self, chain: ExportedChain) -> bool {
        let ExportedChain {
            proofs,
            merkle_root: claimed_root,
        } = chain;
        let incoming = proofs.len();
        let merkle = MerkleAccumulator::from_leaves(proofs.iter().map(|proof| proof.hash.clone()));

        let previous_proofs = std::mem::replace(&mut self.proofs, proofs);
        let previous_merkle = std::mem::replace(&mut self.merkle, merkle);

        let root_matches = self.merkle.root() == claimed_root;
        let report = self.verify_chain();
        if root_matches && report.is_valid() {
            info!(
                "chain import accepted proofs={incoming} root={}",
                self.merkle.root()
            );
            return true;
        }

        warn!(
            "chain import rejected proofs={incoming} root_matches={root_matches} violations={}",
            report.violations.len()
        );
        self.proofs = previous_proofs;
        self.merkle = previous_merkle;
        false
    }

    pub fn inclusion_proof(&self, id: &str) -> Result<MerkleProof> {
        self.proofs
            .iter()
            .position(|proof| proof.id == id)
            .and_then(|index| self.merkle.inclusion_proof(index))
            .ok_or_else(|| ChainError::UnknownProof(id.to_owned()))
    }

    fn proof_id(&self, kind: ProofKind, hash: &str, temporal_anchor: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.config.node_id.as_bytes());
        hasher.update(kind.as_str().as_bytes());
        hasher.update(hash.as_bytes());
        hasher.update(&temporal_anchor.to_le_bytes());
        hasher.update(&self.sequence.to_le_bytes());
        let digest = hasher.finalize().to_hex();
        format!("proof-{}", &digest[..24])
    }
}

/// Check a single proof against the seed in `config`. The record's
/// `proofType`, `phiValue`, `timestamp` and `temporalAnchor` must equal the
/// copies inside the signed metadata.
pub fn proof_is_authentic(config: &ChainConfig, proof: &VerificationProof) -> bool {
    let Ok(hash) = payload_hash(&proof.metadata) else {
        return false;
    };
    hash == proof.hash
        && fields_match_metadata(proof)
        && signature_matches(
            &config.secret_seed,
            proof.temporal_anchor,
            &hash,
            &proof.signature,
            config.signature_hex_len,
        )
}

/// Audit an ordered proof list without adopting it. `merkle_root` is copied
/// into the report as-is.
pub fn audit_report(
    config: &ChainConfig,
    proofs: &[VerificationProof],
    merkle_root: &str,
) -> ChainReport {
    let mut violations = Vec::new();
    let mut chain_integrity = true;
    let mut temporal_continuity = true;
    let mut total_phi_accumulated = 0.0;

    for (index, proof) in proofs.iter().enumerate() {
        total_phi_accumulated += proof.phi_value;

        if !proof_is_authentic(config, proof) {
            chain_integrity = false;
            violations.push(ChainViolation::InvalidProof {
                index,
                id: proof.id.clone(),
            });
        }

        let previous = index.checked_sub(1).map(|prev| &proofs[prev]);
        let expected = previous.map(|prev| prev.id.as_str());
        if proof.previous_proof_id.as_deref() != expected {
            chain_integrity = false;
            violations.push(ChainViolation::BrokenLink {
                index,
                id: proof.id.clone(),
                expected: expected.map(str::to_owned),
                found: proof.previous_proof_id.clone(),
            });
        }

        if let Some(prev) = previous {
            if proof.timestamp < prev.timestamp {
                temporal_continuity = false;
                violations.push(ChainViolation::TimestampRegression {
                    index,
                    id: proof.id.clone(),
                    previous: prev.timestamp,
                    current: proof.timestamp,
                });
            }
        }
    }

    ChainReport {
        chain_integrity,
        temporal_continuity,
        total_phi_accumulated,
        merkle_root: merkle_root.to_owned(),
        length: proofs.len(),
        violations,
    }
}

fn fields_match_metadata(proof: &VerificationProof) -> bool {
    let metadata = &proof.metadata;
    metadata.get("proofType").and_then(Value::as_str) == Some(proof.proof_type.as_str())
        && metadata.get("phiValue").and_then(Value::as_f64) == Some(proof.phi_value)
        && metadata.get("timestamp").and_then(Value::as_i64) == Some(proof.timestamp)
        && metadata.get("temporalAnchor").and_then(Value::as_u64) == Some(proof.temporal_anchor)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppingClock;
    use serde_json::json;

    fn chain() -> ProofChain {
        ProofChain::with_clock(
            ChainConfig::sample("unit"),
            Arc::new(SteppingClock::new(1_700_000_000_000, 10)),
        )
        .unwrap()
    }

    fn payload(n: u64) -> Map<String, Value> {
        match json!({"agentId": "agent-1", "step": n}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn generator_fields_override_caller_keys() {
        let mut chain = chain();
        let mut body = payload(1);
        body.insert("timestamp".into(), json!("forged"));
        let proof = chain.generate_proof(ProofKind::Decision, body, 1.5).unwrap();
        assert_eq!(proof.metadata["timestamp"], json!(proof.timestamp));
        assert_eq!(proof.metadata["temporalAnchor"], json!(proof.temporal_anchor));
        assert_eq!(proof.metadata["proofType"], json!("decision"));
        assert_eq!(proof.metadata["phiValue"], json!(1.5));
    }

    #[test]
    fn recorded_root_includes_the_proof() {
        let mut chain = chain();
        let first = chain.generate_proof(ProofKind::Network, payload(1), 0.0).unwrap();
        assert_eq!(first.merkle_root, first.hash);
        let second = chain.generate_proof(ProofKind::Network, payload(2), 0.0).unwrap();
        assert_eq!(second.merkle_root, chain.merkle_root());
        assert_eq!(chain.proofs()[1].merkle_root, chain.merkle_root());
        assert_eq!(chain.proofs()[0].merkle_root, first.hash);
    }

    #[test]
    fn non_object_payload_is_rejected_without_mutation() {
        let mut chain = chain();
        let err = chain
            .generate_proof_from_value(ProofKind::Evolution, json!([1, 2]), 0.0)
            .unwrap_err();
        assert!(matches!(err, ChainError::PayloadNotObject { found: "array" }));
        assert!(chain.is_empty());
        assert_eq!(chain.merkle_root(), "");
    }

    #[test]
    fn non_finite_phi_is_recorded_as_zero() {
        let mut chain = chain();
        let proof = chain
            .generate_proof(ProofKind::Consciousness, payload(1), f64::NAN)
            .unwrap();
        assert_eq!(proof.phi_value, 0.0);
        assert!(chain.verify_proof(&proof));
    }

    #[test]
    fn inclusion_proof_lookup_by_id() {
        let mut chain = chain();
        let ids: Vec<String> = (0..5)
            .map(|n| chain.generate_proof(ProofKind::Decision, payload(n), 0.0).unwrap().id)
            .collect();
        for (id, proof) in ids.iter().zip(chain.proofs()) {
            let path = chain.inclusion_proof(id).unwrap();
            assert!(path.verify(&proof.hash, chain.merkle_root()));
        }
        assert!(matches!(
            chain.inclusion_proof("proof-missing"),
            Err(ChainError::UnknownProof(_))
        ));
    }

    #[test]
    fn empty_chain_report_is_clean() {
        let report = chain().verify_chain();
        assert!(report.is_valid());
        assert_eq!(report.length, 0);
        assert_eq!(report.total_phi_accumulated, 0.0);
        assert_eq!(report.merkle_root, "");
    }
}
