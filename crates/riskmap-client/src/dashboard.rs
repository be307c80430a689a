//! Risk data load state for the map and summary panels.

use std::sync::Arc;

use riskmap_core::{aggregate, ContractError, RiskCollection, RiskSummary};
use tracing::{info, warn};

use crate::http::Classifier;

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready {
        collection: Arc<RiskCollection>,
        summary: RiskSummary,
    },
    /// Nothing is rendered in this state.
    Failed(ContractError),
}

pub struct Dashboard<C> {
    classifier: C,
    state: LoadState,
}

impl<C: Classifier> Dashboard<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier, state: LoadState::Loading }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn collection(&self) -> Option<Arc<RiskCollection>> {
        match &self.state {
            LoadState::Ready { collection, .. } => Some(Arc::clone(collection)),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&RiskSummary> {
        match &self.state {
            LoadState::Ready { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Fetch a fresh collection and swap it in as a whole.
    pub async fn load(&mut self) -> &LoadState {
        self.state = match self.classifier.risk_data().await {
            Ok(collection) => {
                let summary = aggregate(&collection);
                info!(
                    total = summary.total,
                    low = summary.low,
                    medium = summary.medium,
                    high = summary.high,
                    invalid = summary.invalid,
                    "risk data loaded"
                );
                LoadState::Ready { collection: Arc::new(collection), summary }
            }
            Err(e) => {
                warn!(error = %e, "failed to load risk data");
                LoadState::Failed(e)
            }
        };
        &self.state
    }

    pub async fn reload(&mut self) -> &LoadState {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riskmap_core::{
        ModelInfo, RiskLevel, RiskRecord, Scoring, SimulationRequest, SimulationResult,
        TransportError,
    };
    use serde_json::Value;
    use std::sync::Mutex;

    /// Hands out queued load outcomes in order.
    struct Scripted {
        loads: Mutex<Vec<Result<RiskCollection, ContractError>>>,
    }

    #[async_trait]
    impl Classifier for Scripted {
        async fn risk_data(&self) -> Result<RiskCollection, ContractError> {
            self.loads.lock().unwrap().remove(0)
        }

        async fn predict(&self, _: &SimulationRequest) -> Result<SimulationResult, ContractError> {
            Err(TransportError::new("unused").into())
        }

        async fn model_info(&self) -> Result<ModelInfo, ContractError> {
            Err(TransportError::new("unused").into())
        }
    }

    fn records(levels: &[RiskLevel]) -> RiskCollection {
        RiskCollection::new(
            levels
                .iter()
                .map(|&level| RiskRecord {
                    geometry: Value::Null,
                    scoring: Scoring::Scored { level, score: 0.5 },
                    zone_type: "Market".into(),
                    pop_density: 10.0,
                    waste_volume: 10.0,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn reload_replaces_the_whole_collection() {
        let mut dash = Dashboard::new(Scripted {
            loads: Mutex::new(vec![
                Ok(records(&[RiskLevel::Low, RiskLevel::High])),
                Ok(records(&[RiskLevel::Medium])),
            ]),
        });
        assert!(matches!(dash.state(), LoadState::Loading));

        dash.load().await;
        let first = dash.collection().unwrap();
        assert_eq!(dash.summary().unwrap().total, 2);

        dash.reload().await;
        assert_eq!(dash.summary().unwrap().series(), [0, 1, 0]);
        // Holders of the old collection still see it unchanged.
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn failed_load_exposes_no_collection() {
        let mut dash = Dashboard::new(Scripted {
            loads: Mutex::new(vec![
                Ok(records(&[RiskLevel::Low])),
                Err(TransportError::new("connection refused").into()),
            ]),
        });
        dash.load().await;
        assert!(dash.collection().is_some());

        assert!(matches!(dash.reload().await, LoadState::Failed(ContractError::Transport(_))));
        assert!(dash.collection().is_none());
        assert!(dash.summary().is_none());
    }
}
