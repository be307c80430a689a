//! Visual encoding of risk levels and display formatting of records.
//!
//! Everything here is a pure function of its input. `resolve` is cheap enough
//! to call once per rendered feature without caching.

use serde::Serialize;

use crate::record::{RiskLevel, RiskRecord};

/// Map marker radius in pixels, identical for all levels.
pub const MARKER_RADIUS: f64 = 8.0;

/// Visual encoding of one risk level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskStyle {
    pub level: RiskLevel,
    /// Fill colour, CSS hex.
    pub color: &'static str,
    /// Darker outline used by chart bars.
    pub stroke: &'static str,
    pub radius: f64,
    pub label: &'static str,
    /// Strictly increasing with severity.
    pub severity_rank: u8,
}

/// Circle-marker options for point features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    /// Bahasa Indonesia, used by the simulation result card.
    Id,
}

pub fn resolve(level: RiskLevel) -> RiskStyle {
    let (color, stroke) = match level {
        RiskLevel::Low => ("#22c55e", "#16a34a"),
        RiskLevel::Medium => ("#eab308", "#ca8a04"),
        RiskLevel::High => ("#ef4444", "#dc2626"),
    };
    RiskStyle {
        level,
        color,
        stroke,
        radius: MARKER_RADIUS,
        label: level.as_str(),
        severity_rank: level.rank(),
    }
}

pub fn marker(level: RiskLevel) -> MarkerStyle {
    MarkerStyle {
        radius: MARKER_RADIUS,
        fill_color: resolve(level).color,
        color: "#fff",
        weight: 1.0,
        opacity: 1.0,
        fill_opacity: 0.8,
    }
}

pub fn label(level: RiskLevel, locale: Locale) -> &'static str {
    match (locale, level) {
        (Locale::En, _) => level.as_str(),
        (Locale::Id, RiskLevel::Low) => "RENDAH",
        (Locale::Id, RiskLevel::Medium) => "SEDANG",
        (Locale::Id, RiskLevel::High) => "TINGGI",
    }
}

/// Styles of all levels in ascending severity, for chart series and legends.
pub fn legend() -> [RiskStyle; 3] {
    RiskLevel::ALL.map(resolve)
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Map popup precision: two decimals.
pub fn format_score(score: f64) -> String {
    format!("{score:.2}")
}

/// Simulation card precision: percentage with one decimal.
pub fn format_percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Nearest integer, halves rounded up.
pub fn format_rounded(value: f64) -> String {
    format!("{}", (value + 0.5).floor())
}

/// One key/value line of a popup or summary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupRow {
    pub key: &'static str,
    pub value: String,
}

impl PopupRow {
    fn new(key: &'static str, value: String) -> Self {
        Self { key, value }
    }
}

/// Structured popup content for a map feature.
///
/// Returns `None` for an unscored record: there is nothing to report and no
/// level to fall back on.
pub fn popup(record: &RiskRecord) -> Option<Vec<PopupRow>> {
    let level = record.level()?;
    let score = record.score()?;
    Some(vec![
        PopupRow::new("Risk Level", label(level, Locale::En).to_string()),
        PopupRow::new("Score", format_score(score)),
        PopupRow::new("Zone", record.zone_type.clone()),
        PopupRow::new("Pop Density", format!("{} /km²", format_rounded(record.pop_density))),
        PopupRow::new("Waste Vol", format!("{} kg", format_rounded(record.waste_volume))),
    ])
}
