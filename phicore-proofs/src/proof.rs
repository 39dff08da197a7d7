use phicore_engine::PhiResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofKind {
    Consciousness,
    Decision,
    Evolution,
    Network,
}

impl ProofKind {
    pub const ALL: [Self; 4] = [
        Self::Consciousness,
        Self::Decision,
        Self::Evolution,
        Self::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProofKind::Consciousness => "consciousness",
            ProofKind::Decision => "decision",
            ProofKind::Evolution => "evolution",
            ProofKind::Network => "network",
        }
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link of the proof chain. Records are handed to persistence and
/// transport layers verbatim; `metadata` is the exact payload that was hashed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationProof {
    pub id: String,
    pub proof_type: ProofKind,
    pub hash: String,
    pub signature: String,
    pub timestamp: i64,
    pub temporal_anchor: u64,
    pub phi_value: f64,
    pub previous_proof_id: Option<String>,
    /// Root over every proof up to and including this one.
    pub merkle_root: String,
    pub metadata: Value,
}

/// Typed payloads for each proof kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ProofPayload {
    Consciousness {
        agent_id: String,
        phi: f64,
        integrated_information: f64,
        consciousness_threshold: bool,
        integration_level: f64,
        partition: Vec<Vec<usize>>,
    },
    Decision {
        agent_id: String,
        decision_id: String,
        choice: String,
        confidence: f64,
    },
    Evolution {
        agent_id: String,
        generation: u64,
        fitness: f64,
        mutation_rate: f64,
    },
    Network {
        network_id: String,
        node_count: u64,
        network_phi: f64,
        coherence: f64,
    },
}

impl ProofPayload {
    pub fn consciousness(agent_id: impl Into<String>, result: &PhiResult) -> Self {
        Self::Consciousness {
            agent_id: agent_id.into(),
            phi: result.phi,
            integrated_information: result.integrated_information,
            consciousness_threshold: result.consciousness_threshold,
            integration_level: result.partition_info.integration_level,
            partition: result.partition_info.minimum_information_partition.clone(),
        }
    }

    pub fn kind(&self) -> ProofKind {
        match self {
            ProofPayload::Consciousness { .. } => ProofKind::Consciousness,
            ProofPayload::Decision { .. } => ProofKind::Decision,
            ProofPayload::Evolution { .. } => ProofKind::Evolution,
            ProofPayload::Network { .. } => ProofKind::Network,
        }
    }

    pub fn into_metadata(self) -> Map<String, Value> {
        let value = match self {
            ProofPayload::Consciousness {
                agent_id,
                phi,
                integrated_information,
                consciousness_threshold,
                integration_level,
                partition,
            } => json!({
                "agentId": agent_id,
                "phi": phi,
                "integratedInformation": integrated_information,
                "consciousnessThreshold": consciousness_threshold,
                "integrationLevel": integration_level,
                "partition": partition,
            }),
            ProofPayload::Decision {
                agent_id,
                decision_id,
                choice,
                confidence,
            } => json!({
                "agentId": agent_id,
                "decisionId": decision_id,
                "choice": choice,
                "confidence": confidence,
            }),
            ProofPayload::Evolution {
                agent_id,
                generation,
                fitness,
                mutation_rate,
            } => json!({
                "agentId": agent_id,
                "generation": generation,
                "fitness": fitness,
                "mutationRate": mutation_rate,
            }),
            ProofPayload::Network {
                network_id,
                node_count,
                network_phi,
                coherence,
            } => json!({
                "networkId": network_id,
                "nodeCount": node_count,
                "networkPhi": network_phi,
                "coherence": coherence,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
