//! Classifier service seam and its HTTP/JSON implementation.

use async_trait::async_trait;
use reqwest::Client;
use riskmap_core::{
    decode_response, ContractError, ModelInfo, RiskCollection, SimulationRequest,
    SimulationResult, TransportError,
};
use tracing::debug;

use crate::config::ClientConfig;

/// Everything the dashboard needs from the classifier service.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// `GET /api/risk-data`
    async fn risk_data(&self) -> Result<RiskCollection, ContractError>;

    /// `POST /api/predict`
    async fn predict(&self, request: &SimulationRequest) -> Result<SimulationResult, ContractError>;

    /// `GET /api/model-info`
    async fn model_info(&self) -> Result<ModelInfo, ContractError>;
}

pub struct HttpClassifier {
    client: Client,
    config: ClientConfig,
}

fn transport(e: reqwest::Error) -> TransportError {
    match e.status() {
        Some(status) => TransportError::with_status(e.to_string(), status.as_u16()),
        None => TransportError::new(e.to_string()),
    }
}

impl HttpClassifier {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request and return the body of a 2xx response.
    /// Any other status is a transport failure carrying the body as message.
    async fn body(&self, request: reqwest::RequestBuilder) -> Result<String, TransportError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            };
            return Err(TransportError::with_status(message, status.as_u16()));
        }
        Ok(text)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn risk_data(&self) -> Result<RiskCollection, ContractError> {
        let url = self.config.endpoint("risk-data");
        debug!(%url, "loading risk data");
        let text = self.body(self.client.get(&url)).await?;
        Ok(RiskCollection::from_geojson(&text)?)
    }

    async fn predict(&self, request: &SimulationRequest) -> Result<SimulationResult, ContractError> {
        let url = self.config.endpoint("predict");
        debug!(%url, body = %request.to_json(), "requesting prediction");
        let text = self.body(self.client.post(&url).json(request)).await?;
        Ok(decode_response(&text)?)
    }

    async fn model_info(&self) -> Result<ModelInfo, ContractError> {
        let url = self.config.endpoint("model-info");
        let text = self.body(self.client.get(&url)).await?;
        let info = ModelInfo::decode(&text)?;
        info.check()?;
        Ok(info)
    }
}
