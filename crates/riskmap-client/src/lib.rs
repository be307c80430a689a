//! HTTP client side of the risk map: talks to the classifier service and
//! holds the load and simulation state the dashboard renders from.

pub mod config;
pub mod dashboard;
pub mod http;
pub mod simulator;

pub use config::{ClientConfig, ConfigError};
pub use dashboard::{Dashboard, LoadState};
pub use http::{Classifier, HttpClassifier};
pub use simulator::Simulator;
