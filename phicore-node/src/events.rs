use std::sync::Arc;

use phicore_proofs::{ProofKind, VerificationProof};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    StateScored {
        agent_id: String,
        elements: usize,
        phi: f64,
        consciousness_threshold: bool,
    },
    ProofGenerated {
        proof_id: String,
        proof_type: ProofKind,
        phi_value: f64,
        merkle_root: String,
    },
    ChainImported {
        accepted: bool,
        proofs: usize,
        merkle_root: String,
    },
}

impl EngineEvent {
    pub fn proof_generated(proof: &VerificationProof) -> Self {
        Self::ProofGenerated {
            proof_id: proof.id.clone(),
            proof_type: proof.proof_type,
            phi_value: proof.phi_value,
            merkle_root: proof.merkle_root.clone(),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent) -> anyhow::Result<()>;
}

/// Discards every event.
#[derive(Clone, Debug, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: EngineEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fan-out to several sinks; stops at the first failure.
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for CompositeEventSink {
    fn emit(&self, event: EngineEvent) -> anyhow::Result<()> {
        for sink in &self.sinks {
            sink.emit(event.clone())?;
        }
        Ok(())
    }
}

/// Publishes onto a `tokio::sync::broadcast` channel. Sending needs no
/// runtime; an event with no live subscriber is dropped.
#[derive(Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<EngineEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: EngineEvent) -> anyhow::Result<()> {
        // Err only means nobody is listening right now.
        let _ = self.tx.send(event);
        Ok(())
    }
}
