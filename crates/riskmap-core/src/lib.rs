//! Contract layer between a waste-accumulation risk classifier and the map
//! dashboard that displays its results.

pub mod contract;
pub mod error;
pub mod record;
pub mod session;
pub mod stats;
pub mod style;

pub use contract::{
    decode_response, ClassProbabilities, ModelInfo, RoadAccess, SimulationInput,
    SimulationRequest, SimulationResult,
};
pub use error::{
    ContractError, IntegrityViolation, SchemaError, TransportError, ValidationError, ViolationKind,
};
pub use record::{RiskCollection, RiskLevel, RiskRecord, Scoring};
pub use session::{Completion, SessionError, SessionState, SimulationSession, SubmitPolicy, Ticket};
pub use stats::{aggregate, RiskSummary};
pub use style::{resolve, RiskStyle};
