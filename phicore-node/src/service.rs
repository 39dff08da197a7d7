use std::{sync::Arc, time::Instant};

use parking_lot::Mutex;
use phicore_engine::{PhiConfigError, PhiEngine, PhiResult, SystemState};
use phicore_proofs::{
    ChainError, ChainReport, ExportedChain, MerkleProof, ProofChain, ProofPayload,
    VerificationProof,
};
use phicore_telemetry::{TelemetryError, TelemetryHandle};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::events::{EngineEvent, EventSink};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Engine(#[from] PhiConfigError),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub agent_id: String,
    pub result: PhiResult,
    pub proof: VerificationProof,
}

/// Scores states and attests each result on a single proof chain.
///
/// Chain writes go through one mutex, so the service can be shared across
/// threads behind an `Arc`.
pub struct ScoringService {
    engine: PhiEngine,
    chain: Mutex<ProofChain>,
    telemetry: TelemetryHandle,
    sink: Arc<dyn EventSink>,
}

impl ScoringService {
    pub fn new(
        engine: PhiEngine,
        chain: ProofChain,
        telemetry: TelemetryHandle,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            engine,
            chain: Mutex::new(chain),
            telemetry,
            sink,
        }
    }

    pub fn from_config(
        config: &Config,
        telemetry: TelemetryHandle,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ServiceError> {
        let engine = PhiEngine::new(config.engine.clone())?;
        let chain = ProofChain::new(config.chain.clone())?;
        Ok(Self::new(engine, chain, telemetry, sink))
    }

    pub fn telemetry(&self) -> &TelemetryHandle {
        &self.telemetry
    }

    pub fn chain_len(&self) -> usize {
        self.chain.lock().len()
    }

    pub fn merkle_root(&self) -> String {
        self.chain.lock().merkle_root().to_owned()
    }

    /// Compute Φ for `state` and append a consciousness proof for the result.
    pub fn score(&self, agent_id: &str, state: &SystemState) -> Result<ScoreOutcome, ServiceError> {
        let started = Instant::now();
        let result = self.engine.compute_phi(state);
        self.telemetry
            .record_latency_us("phi.compute_us", started.elapsed().as_micros() as u64);
        self.telemetry.record_counter("phi.computed", 1)?;
        if result.consciousness_threshold {
            self.telemetry.record_counter("phi.threshold_crossed", 1)?;
        }
        self.telemetry.record_gauge("phi.last", result.phi);
        debug!(
            agent = agent_id,
            elements = state.len(),
            phi = result.phi,
            integrated_information = result.integrated_information,
            "state scored"
        );
        self.publish(EngineEvent::StateScored {
            agent_id: agent_id.to_owned(),
            elements: state.len(),
            phi: result.phi,
            consciousness_threshold: result.consciousness_threshold,
        });

        let proof = self.attest(ProofPayload::consciousness(agent_id, &result), result.phi)?;
        Ok(ScoreOutcome {
            agent_id: agent_id.to_owned(),
            result,
            proof,
        })
    }

    pub fn attest(
        &self,
        payload: ProofPayload,
        phi_value: f64,
    ) -> Result<VerificationProof, ServiceError> {
        let kind = payload.kind();
        let proof = self.chain.lock().attest(payload, phi_value)?;
        // Already committed; counting is best effort from here on.
        self.count(&format!("proofs.generated.{kind}"));
        info!(
            proof_id = %proof.id,
            proof_type = %kind,
            phi = proof.phi_value,
            merkle_root = %proof.merkle_root,
            "proof generated"
        );
        self.publish(EngineEvent::proof_generated(&proof));
        Ok(proof)
    }

    pub fn verify_proof(&self, proof: &VerificationProof) -> bool {
        let valid = self.chain.lock().verify_proof(proof);
        if !valid {
            warn!(proof_id = %proof.id, "proof failed verification");
            self.count("proofs.verify_failed");
        }
        valid
    }

    pub fn verify_chain(&self) -> ChainReport {
        let report = self.chain.lock().verify_chain();
        if !report.is_valid() {
            warn!(
                violations = report.violations.len(),
                integrity = report.chain_integrity,
                temporal = report.temporal_continuity,
                "chain verification failed"
            );
        }
        report
    }

    pub fn export_chain(&self) -> ExportedChain {
        self.chain.lock().export_chain()
    }

    /// Replace the local chain with `chain` if it verifies; otherwise the
    /// local chain is left as it was.
    pub fn import_chain(&self, chain: ExportedChain) -> bool {
        let proofs = chain.proofs.len();
        let (accepted, merkle_root) = {
            let mut guard = self.chain.lock();
            let accepted = guard.import_and_verify_chain(chain);
            (accepted, guard.merkle_root().to_owned())
        };
        self.count(if accepted {
            "chain.import.accepted"
        } else {
            "chain.import.rejected"
        });
        self.publish(EngineEvent::ChainImported {
            accepted,
            proofs,
            merkle_root,
        });
        accepted
    }

    pub fn inclusion_proof(&self, proof_id: &str) -> Result<MerkleProof, ServiceError> {
        Ok(self.chain.lock().inclusion_proof(proof_id)?)
    }

    fn count(&self, name: &str) {
        if let Err(err) = self.telemetry.record_counter(name, 1) {
            warn!(error = %err, "telemetry counter dropped");
        }
    }

    fn publish(&self, event: EngineEvent) {
        if let Err(err) = self.sink.emit(event) {
            warn!(error = %err, "event sink rejected event");
        }
    }
}

#[cfg(test)]
mod tests {
    use phicore_proofs::{ChainConfig, SteppingClock};
    use phicore_telemetry::TelemetryConfig;

    use super::*;
    use crate::events::NoopEventSink;

    fn service() -> ScoringService {
        let chain = ProofChain::with_clock(
            ChainConfig::sample("service-unit"),
            Arc::new(SteppingClock::new(1_700_000_000_000, 5)),
        )
        .unwrap();
        ScoringService::new(
            PhiEngine::default(),
            chain,
            TelemetryHandle::from_config(TelemetryConfig::sample("http://localhost")),
            Arc::new(NoopEventSink),
        )
    }

    #[test]
    fn score_records_metrics_and_proof() {
        let service = service();
        let outcome = service
            .score("agent-1", &SystemState::uniform(4, 0.5, 0.3, 0.9))
            .unwrap();
        assert!(service.verify_proof(&outcome.proof));
        assert_eq!(outcome.proof.phi_value, outcome.result.phi);

        let snapshot = service.telemetry().flush();
        assert_eq!(snapshot.counter("phi.computed"), 1);
        assert_eq!(snapshot.counter("proofs.generated.consciousness"), 1);
        assert_eq!(snapshot.latencies_us["phi.compute_us"].len(), 1);
        assert_eq!(snapshot.gauges["phi.last"], outcome.result.phi);
    }

    #[test]
    fn saturated_counter_does_not_fail_a_committed_proof() {
        let service = service();
        service
            .telemetry()
            .record_counter("proofs.generated.network", u64::MAX)
            .unwrap();
        let proof = service
            .attest(
                ProofPayload::Network {
                    network_id: "mesh-1".into(),
                    node_count: 3,
                    network_phi: 0.5,
                    coherence: 0.8,
                },
                0.5,
            )
            .unwrap();
        assert_eq!(service.chain_len(), 1);
        assert!(service.verify_proof(&proof));
        assert_eq!(
            service.telemetry().flush().counter("proofs.generated.network"),
            u64::MAX
        );
    }

    #[test]
    fn unknown_proof_id_is_an_error() {
        let service = service();
        assert!(matches!(
            service.inclusion_proof("proof-missing"),
            Err(ServiceError::Chain(ChainError::UnknownProof(_)))
        ));
    }
}
