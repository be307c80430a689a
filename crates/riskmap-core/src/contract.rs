//! Request and response schema of the what-if classifier endpoint.
//!
//! `SimulationInput` is what the user edits; it may hold anything. The only
//! way to obtain a `SimulationRequest` is `SimulationInput::validate`, so a
//! request that reaches the wire has already passed every field constraint.
//! Responses go through `decode_response`, which never guesses a risk level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SchemaError, ValidationError};
use crate::record::{RiskLevel, Scoring};
use crate::style::{self, Locale};

// ── Request ───────────────────────────────────────────────────────────────────

/// Road access quality around the zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadAccess {
    Good,
    Moderate,
    Poor,
}

impl RoadAccess {
    pub const ALL: [RoadAccess; 3] = [RoadAccess::Good, RoadAccess::Moderate, RoadAccess::Poor];

    pub fn as_str(self) -> &'static str {
        match self {
            RoadAccess::Good => "Good",
            RoadAccess::Moderate => "Moderate",
            RoadAccess::Poor => "Poor",
        }
    }
}

impl fmt::Display for RoadAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RoadAccess {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Good" => Ok(RoadAccess::Good),
            "Moderate" => Ok(RoadAccess::Moderate),
            "Poor" => Ok(RoadAccess::Poor),
            other => Err(ValidationError::UnknownRoadAccess(other.to_string())),
        }
    }
}

/// Candidate feature values as edited by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Persons per km².
    pub pop_density: f64,
    /// Metres to the nearest disposal site.
    #[serde(rename = "dist_tps", alias = "dist_to_disposal")]
    pub dist_to_disposal: f64,
    /// kg per day.
    pub waste_volume: f64,
    pub road_access: String,
    pub zone_type: String,
}

impl Default for SimulationInput {
    fn default() -> Self {
        Self {
            pop_density: 3000.0,
            dist_to_disposal: 500.0,
            waste_volume: 50.0,
            road_access: RoadAccess::Moderate.as_str().to_string(),
            zone_type: "Residential".to_string(),
        }
    }
}

/// A request body that satisfies every field constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRequest {
    pop_density: f64,
    #[serde(rename = "dist_tps")]
    dist_to_disposal: f64,
    waste_volume: f64,
    road_access: RoadAccess,
    zone_type: String,
}

impl SimulationRequest {
    pub fn pop_density(&self) -> f64 {
        self.pop_density
    }

    pub fn dist_to_disposal(&self) -> f64 {
        self.dist_to_disposal
    }

    pub fn waste_volume(&self) -> f64 {
        self.waste_volume
    }

    pub fn road_access(&self) -> RoadAccess {
        self.road_access
    }

    pub fn zone_type(&self) -> &str {
        &self.zone_type
    }

    /// JSON body for `POST /api/predict`.
    pub fn to_json(&self) -> String {
        // Only finite numbers, strings and unit variants: cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

impl SimulationInput {
    /// Check every field, in wire order, and build the request.
    /// The first failing field is reported.
    pub fn validate(&self) -> Result<SimulationRequest, ValidationError> {
        Ok(SimulationRequest {
            pop_density: non_negative("pop_density", self.pop_density)?,
            dist_to_disposal: positive("dist_to_disposal", self.dist_to_disposal)?,
            waste_volume: non_negative("waste_volume", self.waste_volume)?,
            road_access: self.road_access.parse()?,
            zone_type: self.zone_type.clone(),
        })
    }

    /// Every failing field, for forms that flag all of them at once.
    pub fn violations(&self) -> Vec<ValidationError> {
        [
            non_negative("pop_density", self.pop_density).err(),
            positive("dist_to_disposal", self.dist_to_disposal).err(),
            non_negative("waste_volume", self.waste_volume).err(),
            self.road_access.parse::<RoadAccess>().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Per-class probabilities reported alongside a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ClassProbabilities {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl ClassProbabilities {
    pub fn get(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

/// Decoded prediction. Same shape as the scored part of a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationResult {
    pub level: RiskLevel,
    /// In [0, 1].
    pub score: f64,
    pub probabilities: Option<ClassProbabilities>,
}

impl SimulationResult {
    pub fn scoring(&self) -> Scoring {
        Scoring::Scored { level: self.level, score: self.score }
    }

    /// Content of the simulation result card.
    pub fn card(&self) -> ResultCard {
        ResultCard {
            label: style::label(self.level, Locale::Id),
            color: style::resolve(self.level).color,
            confidence: style::format_percent(self.score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    pub label: &'static str,
    pub color: &'static str,
    /// e.g. "87.3%".
    pub confidence: String,
}

fn unit_interval(field: &'static str, value: &Value) -> Result<f64, SchemaError> {
    let x = value
        .as_f64()
        .ok_or(SchemaError::WrongType { field, expected: "number" })?;
    if !(0.0..=1.0).contains(&x) {
        return Err(SchemaError::OutOfRange { field, value: x });
    }
    Ok(x)
}

fn decode_probabilities(details: &Map<String, Value>) -> Result<ClassProbabilities, SchemaError> {
    let mut probs = ClassProbabilities::default();
    for (name, value) in details {
        let level: RiskLevel = name.parse()?;
        let p = unit_interval("details", value)?;
        match level {
            RiskLevel::Low => probs.low = p,
            RiskLevel::Medium => probs.medium = p,
            RiskLevel::High => probs.high = p,
        }
    }
    Ok(probs)
}

/// Decode a parsed `POST /api/predict` response.
pub fn decode_response_value(value: &Value) -> Result<SimulationResult, SchemaError> {
    let obj = value
        .as_object()
        .ok_or(SchemaError::WrongType { field: "response", expected: "object" })?;

    let level = match obj.get("risk_level") {
        None | Some(Value::Null) => return Err(SchemaError::MissingField("risk_level")),
        Some(Value::String(s)) => s.parse::<RiskLevel>()?,
        Some(_) => return Err(SchemaError::WrongType { field: "risk_level", expected: "string" }),
    };

    let score = match obj.get("risk_score") {
        None | Some(Value::Null) => return Err(SchemaError::MissingField("risk_score")),
        Some(v) => unit_interval("risk_score", v)?,
    };

    let probabilities = match obj.get("details") {
        None | Some(Value::Null) => None,
        Some(Value::Object(details)) => Some(decode_probabilities(details)?),
        Some(_) => return Err(SchemaError::WrongType { field: "details", expected: "object" }),
    };

    Ok(SimulationResult { level, score, probabilities })
}

/// Decode a raw `POST /api/predict` response body.
pub fn decode_response(body: &str) -> Result<SimulationResult, SchemaError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    decode_response_value(&value)
}

// ── Model info ────────────────────────────────────────────────────────────────

/// Request fields the classifier must be trained on.
pub const REQUEST_FEATURES: [&str; 5] =
    ["pop_density", "dist_tps", "waste_volume", "road_access", "zone_type"];

/// `GET /api/model-info` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub features: Vec<String>,
    pub classes: Vec<String>,
}

impl ModelInfo {
    pub fn decode(body: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(body).map_err(|e| SchemaError::Malformed(e.to_string()))
    }

    /// Confirm the service speaks the same vocabulary as this client.
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut seen = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let level: RiskLevel = class.parse()?;
            if seen.contains(&level) {
                return Err(SchemaError::ModelInfo(format!("class {level} listed twice")));
            }
            seen.push(level);
        }
        if let Some(missing) = RiskLevel::ALL.into_iter().find(|l| !seen.contains(l)) {
            return Err(SchemaError::ModelInfo(format!("class {missing} is missing")));
        }
        if let Some(missing) = REQUEST_FEATURES
            .into_iter()
            .find(|f| !self.features.iter().any(|g| g == f))
        {
            return Err(SchemaError::ModelInfo(format!("feature {missing} is not used by the model")));
        }
        Ok(())
    }
}
