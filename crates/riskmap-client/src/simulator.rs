//! Drives a [`SimulationSession`] against a [`Classifier`].

use riskmap_core::{
    Completion, SessionError, SimulationInput, SimulationSession, SubmitPolicy,
};
use tracing::info;

use crate::http::Classifier;

pub struct Simulator<C> {
    classifier: C,
    session: SimulationSession,
}

impl<C: Classifier> Simulator<C> {
    pub fn new(classifier: C, policy: SubmitPolicy) -> Self {
        Self { classifier, session: SimulationSession::new(policy) }
    }

    pub fn with_input(classifier: C, input: SimulationInput, policy: SubmitPolicy) -> Self {
        Self { classifier, session: SimulationSession::with_input(input, policy) }
    }

    pub fn session(&self) -> &SimulationSession {
        &self.session
    }

    pub fn edit(&mut self, f: impl FnOnce(&mut SimulationInput)) {
        self.session.edit(f);
    }

    /// Submit the current input and wait for the classifier.
    ///
    /// Validation failures return before any network call. Transport and
    /// schema failures are recorded in the session state, not returned.
    pub async fn run(&mut self) -> Result<Completion, SessionError> {
        let ticket = self.session.submit()?;
        info!(seq = ticket.seq, "issuing simulation request");
        let outcome = self.classifier.predict(&ticket.request).await;
        Ok(self.session.complete(ticket.seq, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riskmap_core::{
        ContractError, ModelInfo, RiskCollection, RiskLevel, SchemaError, SimulationRequest,
        SimulationResult, TransportError, ValidationError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores by population density; counts calls.
    #[derive(Default)]
    struct DensityClassifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for DensityClassifier {
        async fn risk_data(&self) -> Result<RiskCollection, ContractError> {
            Ok(RiskCollection::default())
        }

        async fn predict(&self, request: &SimulationRequest) -> Result<SimulationResult, ContractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match request.pop_density() {
                d if d > 10_000.0 => Err(TransportError::with_status("Model not trained yet.", 503).into()),
                d if d > 4_000.0 => Ok(SimulationResult { level: RiskLevel::High, score: 0.873, probabilities: None }),
                _ => Ok(SimulationResult { level: RiskLevel::Low, score: 0.61, probabilities: None }),
            }
        }

        async fn model_info(&self) -> Result<ModelInfo, ContractError> {
            Err(SchemaError::MissingField("classes").into())
        }
    }

    #[tokio::test]
    async fn run_applies_the_prediction() {
        let mut sim = Simulator::new(DensityClassifier::default(), SubmitPolicy::Reject);
        sim.edit(|i| i.pop_density = 4500.0);
        assert_eq!(sim.run().await.unwrap(), Completion::Applied);
        let card = sim.session().result().unwrap().card();
        assert_eq!(card.label, "TINGGI");
        assert_eq!(card.confidence, "87.3%");
    }

    #[tokio::test]
    async fn validation_failure_skips_the_network() {
        let mut sim = Simulator::new(DensityClassifier::default(), SubmitPolicy::Reject);
        sim.edit(|i| i.dist_to_disposal = 0.0);
        let err = sim.run().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Validation(ValidationError::NotPositive { field: "dist_to_disposal", value: 0.0 })
        );
        assert_eq!(sim.classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn service_failure_is_recorded_and_retry_recovers() {
        let mut sim = Simulator::new(DensityClassifier::default(), SubmitPolicy::Reject);
        assert_eq!(sim.run().await.unwrap(), Completion::Applied);

        sim.edit(|i| i.pop_density = 20_000.0);
        assert_eq!(sim.run().await.unwrap(), Completion::Failed);
        assert!(sim.session().is_stale());
        assert!(matches!(sim.session().error(), Some(ContractError::Transport(t)) if t.status == Some(503)));

        sim.edit(|i| i.pop_density = 100.0);
        assert_eq!(sim.run().await.unwrap(), Completion::Applied);
        assert!(!sim.session().is_stale());
        assert!(!sim.session().is_busy());
    }
}
