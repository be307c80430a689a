//! Canonical in-memory model of classified zones.
//!
//! A [`RiskCollection`] is built once per data load from the GeoJSON served by
//! `GET /api/risk-data` and never mutated afterwards. Features that cannot be
//! represented as a valid [`RiskRecord`] are kept out of the record list and
//! reported as [`IntegrityViolation`]s instead of being coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{IntegrityViolation, SchemaError, UnknownRiskLevel, ViolationKind};

// ── Risk level ────────────────────────────────────────────────────────────────

/// Three-way ordinal classification. `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// All levels in ascending severity.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// 0 for Low, 2 for High.
    pub fn rank(self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    /// Exact, case-sensitive match on the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(UnknownRiskLevel(other.to_string())),
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────────────────────

/// Level and score always travel together; there is no state with one but
/// not the other.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scoring {
    /// Nothing classified yet (simulation view before the first result).
    #[default]
    Unscored,
    Scored { level: RiskLevel, score: f64 },
}

impl Scoring {
    /// Build a scored value, rejecting non-finite or negative scores.
    pub fn scored(level: RiskLevel, score: f64) -> Result<Self, ViolationKind> {
        if !score.is_finite() || score < 0.0 {
            return Err(ViolationKind::InvalidRiskScore(score));
        }
        Ok(Scoring::Scored { level, score })
    }

    pub fn level(&self) -> Option<RiskLevel> {
        match self {
            Scoring::Scored { level, .. } => Some(*level),
            Scoring::Unscored => None,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Scoring::Scored { score, .. } => Some(*score),
            Scoring::Unscored => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Scoring::Scored { .. })
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One classified zone.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRecord {
    /// GeoJSON geometry object, passed through untouched.
    pub geometry: Value,
    pub scoring: Scoring,
    /// Free-form category (Residential, Market, ...), display only.
    pub zone_type: String,
    /// Persons per km².
    pub pop_density: f64,
    /// kg per day.
    pub waste_volume: f64,
}

impl RiskRecord {
    pub fn level(&self) -> Option<RiskLevel> {
        self.scoring.level()
    }

    pub fn score(&self) -> Option<f64> {
        self.scoring.score()
    }
}

// ── Collection ────────────────────────────────────────────────────────────────

/// Immutable result of one data load.
///
/// `records` keeps source order for rendering. `len()` counts every feature of
/// the source document, valid or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskCollection {
    records: Vec<RiskRecord>,
    violations: Vec<IntegrityViolation>,
}

#[derive(Deserialize)]
struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<FeatureDoc>,
}

#[derive(Deserialize)]
struct FeatureDoc {
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

impl RiskCollection {
    pub fn new(records: Vec<RiskRecord>) -> Self {
        Self { records, violations: Vec::new() }
    }

    /// Decode a GeoJSON FeatureCollection.
    ///
    /// A document that is not a FeatureCollection is a schema error and yields
    /// no collection at all. Individual features with bad risk attributes are
    /// recorded as violations and the rest of the document still loads.
    pub fn from_geojson(text: &str) -> Result<Self, SchemaError> {
        let doc: FeatureCollectionDoc =
            serde_json::from_str(text).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        Self::from_doc(doc)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let doc: FeatureCollectionDoc =
            serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        Self::from_doc(doc)
    }

    fn from_doc(doc: FeatureCollectionDoc) -> Result<Self, SchemaError> {
        if doc.kind != "FeatureCollection" {
            return Err(SchemaError::WrongType { field: "type", expected: "FeatureCollection" });
        }

        let mut records = Vec::with_capacity(doc.features.len());
        let mut violations = Vec::new();
        for (index, feature) in doc.features.into_iter().enumerate() {
            match decode_feature(feature) {
                Ok(record) => records.push(record),
                Err(kind) => {
                    debug!(index, %kind, "rejecting feature");
                    violations.push(IntegrityViolation { index, kind });
                }
            }
        }

        if !violations.is_empty() {
            warn!(
                invalid = violations.len(),
                valid = records.len(),
                "risk data contains features that cannot be classified"
            );
        }

        Ok(Self { records, violations })
    }

    /// Valid records in source order.
    pub fn records(&self) -> &[RiskRecord] {
        &self.records
    }

    pub fn violations(&self) -> &[IntegrityViolation] {
        &self.violations
    }

    /// Number of features in the source, including rejected ones.
    pub fn len(&self) -> usize {
        self.records.len() + self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RiskRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RiskCollection {
    type Item = &'a RiskRecord;
    type IntoIter = std::slice::Iter<'a, RiskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── Feature decoding ──────────────────────────────────────────────────────────

fn decode_feature(feature: FeatureDoc) -> Result<RiskRecord, ViolationKind> {
    let props = feature.properties.unwrap_or_default();

    let level = match props.get("risk_level") {
        None | Some(Value::Null) => return Err(ViolationKind::MissingRiskLevel),
        Some(Value::String(s)) => s
            .parse::<RiskLevel>()
            .map_err(|e| ViolationKind::UnknownRiskLevel(e.0))?,
        Some(_) => return Err(ViolationKind::WrongType("risk_level")),
    };

    let score = match props.get("risk_score") {
        None | Some(Value::Null) => return Err(ViolationKind::MissingRiskScore),
        Some(Value::Number(n)) => n.as_f64().ok_or(ViolationKind::WrongType("risk_score"))?,
        Some(_) => return Err(ViolationKind::WrongType("risk_score")),
    };
    let scoring = Scoring::scored(level, score)?;

    let pop_density = attribute(&props, "pop_density")?;
    let waste_volume = attribute(&props, "waste_volume")?;

    let zone_type = match props.get("zone_type") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ViolationKind::WrongType("zone_type")),
    };

    Ok(RiskRecord {
        geometry: feature.geometry,
        scoring,
        zone_type,
        pop_density,
        waste_volume,
    })
}

/// Finite, non-negative numeric property.
fn attribute(props: &Map<String, Value>, field: &'static str) -> Result<f64, ViolationKind> {
    let value = match props.get(field) {
        None | Some(Value::Null) => return Err(ViolationKind::MissingAttribute(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or(ViolationKind::WrongType(field))?,
        Some(_) => return Err(ViolationKind::WrongType(field)),
    };
    if !value.is_finite() || value < 0.0 {
        return Err(ViolationKind::InvalidAttribute { field, value });
    }
    Ok(value)
}
