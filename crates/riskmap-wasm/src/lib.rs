use riskmap_core::{
    contract::ResultCard,
    stats::aggregate,
    style::{self, MarkerStyle, PopupRow},
    Completion, RiskCollection, RiskLevel, RiskStyle, RiskSummary, SessionError,
    SimulationInput, SimulationResult, SimulationSession, SubmitPolicy, TransportError,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_level(level: &str) -> Result<RiskLevel, String> {
    level.parse::<RiskLevel>().map_err(|e| e.to_string())
}

// ── Map and panels ────────────────────────────────────────────────────────────

/// Style for a risk level name. Unknown names throw; there is no fallback.
#[wasm_bindgen(js_name = riskStyle)]
pub fn risk_style(level: &str) -> Result<JsValue, JsValue> {
    let style: RiskStyle = style::resolve(parse_level(level)?);
    to_js(&style)
}

/// Circle-marker options for a point feature.
#[wasm_bindgen(js_name = markerStyle)]
pub fn marker_style(level: &str) -> Result<JsValue, JsValue> {
    let marker: MarkerStyle = style::marker(parse_level(level)?);
    to_js(&marker)
}

/// The three styles in ascending severity, for chart series.
#[wasm_bindgen]
pub fn legend() -> Result<JsValue, JsValue> {
    to_js(&style::legend())
}

#[derive(Debug, Serialize)]
struct SummaryView {
    #[serde(flatten)]
    summary: RiskSummary,
    series: [usize; 3],
    dominant: Option<RiskLevel>,
    /// One line per rejected feature.
    violations: Vec<String>,
}

fn summary_view(geojson: &str) -> Result<SummaryView, String> {
    let collection = RiskCollection::from_geojson(geojson).map_err(|e| e.to_string())?;
    let summary = aggregate(&collection);
    Ok(SummaryView {
        series: summary.series(),
        dominant: summary.dominant(),
        violations: collection.violations().iter().map(|v| v.to_string()).collect(),
        summary,
    })
}

/// Counts and derived metrics for the sidebar.
#[wasm_bindgen]
pub fn summarize(geojson: &str) -> Result<JsValue, JsValue> {
    to_js(&summary_view(geojson)?)
}

fn popup_rows(feature_json: &str) -> Result<Vec<PopupRow>, String> {
    let doc = format!(r#"{{"type":"FeatureCollection","features":[{feature_json}]}}"#);
    let collection = RiskCollection::from_geojson(&doc).map_err(|e| e.to_string())?;
    if let Some(violation) = collection.violations().first() {
        return Err(violation.kind.to_string());
    }
    collection
        .records()
        .first()
        .and_then(style::popup)
        .ok_or_else(|| "feature is not scored".to_string())
}

/// Popup rows for one GeoJSON feature.
#[wasm_bindgen]
pub fn popup(feature_json: &str) -> Result<JsValue, JsValue> {
    to_js(&popup_rows(feature_json)?)
}

// ── Simulation ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct FieldError {
    field: &'static str,
    message: String,
}

fn request_body(input_json: &str) -> Result<String, FieldError> {
    let input: SimulationInput = serde_json::from_str(input_json).map_err(|e| FieldError {
        field: "input",
        message: e.to_string(),
    })?;
    let request = input.validate().map_err(|e| FieldError {
        field: e.field(),
        message: e.to_string(),
    })?;
    Ok(request.to_json())
}

/// Validate user input and return the `POST /api/predict` body.
/// Throws `{field, message}` naming the offending field.
#[wasm_bindgen(js_name = validateInput)]
pub fn validate_input(input_json: &str) -> Result<String, JsValue> {
    request_body(input_json).map_err(|e| to_js(&e).unwrap_or_else(|j| j))
}

#[derive(Debug, Serialize)]
struct PredictionView {
    #[serde(flatten)]
    result: SimulationResult,
    card: ResultCard,
}

impl From<SimulationResult> for PredictionView {
    fn from(result: SimulationResult) -> Self {
        Self { card: result.card(), result }
    }
}

/// Decode a `POST /api/predict` response body. Throws on contract drift.
#[wasm_bindgen(js_name = decodePrediction)]
pub fn decode_prediction(body: &str) -> Result<JsValue, JsValue> {
    let result = riskmap_core::decode_response(body).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&PredictionView::from(result))
}

#[derive(Debug, Serialize)]
struct TicketView {
    seq: u64,
    body: String,
}

fn completion_name(c: Completion) -> &'static str {
    match c {
        Completion::Applied => "applied",
        Completion::Failed => "failed",
        Completion::Discarded => "discarded",
    }
}

/// Browser-side simulation session. JS performs the fetch; this object
/// decides which response is allowed to land.
#[wasm_bindgen]
pub struct Session {
    inner: SimulationSession,
}

#[wasm_bindgen]
impl Session {
    #[wasm_bindgen(constructor)]
    pub fn new(supersede: bool) -> Session {
        let policy = if supersede { SubmitPolicy::Supersede } else { SubmitPolicy::Reject };
        Session { inner: SimulationSession::new(policy) }
    }

    /// Replace the edited input wholesale.
    #[wasm_bindgen(js_name = setInput)]
    pub fn set_input(&mut self, input_json: &str) -> Result<(), JsValue> {
        let input: SimulationInput =
            serde_json::from_str(input_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.edit(|current| *current = input);
        Ok(())
    }

    /// Returns `{seq, body}`; throws when busy or when the input is invalid.
    pub fn submit(&mut self) -> Result<JsValue, JsValue> {
        let ticket = self.inner.submit().map_err(|e| match &e {
            SessionError::Validation(v) => to_js(&FieldError { field: v.field(), message: v.to_string() })
                .unwrap_or_else(|j| j),
            SessionError::Busy(_) => JsValue::from_str(&e.to_string()),
        })?;
        to_js(&TicketView { seq: ticket.seq, body: ticket.request.to_json() })
    }

    /// Hand back the response body for ticket `seq`.
    pub fn complete(&mut self, seq: u64, body: &str) -> String {
        completion_name(self.inner.complete_body(seq, Ok(body))).to_string()
    }

    /// Report that the request for ticket `seq` never got a response.
    pub fn fail(&mut self, seq: u64, message: &str, status: Option<u16>) -> String {
        let error = match status {
            Some(s) => TransportError::with_status(message, s),
            None => TransportError::new(message),
        };
        completion_name(self.inner.complete_body(seq, Err(error))).to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.inner.is_busy()
    }

    #[wasm_bindgen(getter)]
    pub fn stale(&self) -> bool {
        self.inner.is_stale()
    }

    /// Latest result with its card, or `null`.
    pub fn result(&self) -> Result<JsValue, JsValue> {
        match self.inner.result() {
            Some(r) => to_js(&PredictionView::from(*r)),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.inner.error().map(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type":"Feature","geometry":{"type":"Point","coordinates":[124.84,1.49]},
             "properties":{"risk_level":"High","risk_score":0.92,"pop_density":4200,"waste_volume":3150.4,"zone_type":"Market"}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[124.85,1.50]},
             "properties":{"risk_level":"Low","risk_score":0.18,"pop_density":300,"waste_volume":140,"zone_type":"Office"}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[124.86,1.51]},
             "properties":{"risk_level":"low","risk_score":0.2,"pop_density":310,"waste_volume":150,"zone_type":"Office"}}
        ]
    }"#;

    #[test]
    fn summary_lists_rejected_features() {
        let view = summary_view(DATA).unwrap();
        assert_eq!(view.series, [1, 0, 1]);
        assert_eq!(view.summary.invalid, 1);
        assert_eq!(view.summary.total, 3);
        assert_eq!(view.violations.len(), 1);
        assert!(view.violations[0].starts_with("feature #2"));
    }

    #[test]
    fn summary_rejects_non_geojson() {
        assert!(summary_view("[]").is_err());
    }

    #[test]
    fn popup_for_one_feature() {
        let feature = r#"{"type":"Feature","geometry":null,
            "properties":{"risk_level":"Medium","risk_score":0.873,"pop_density":999.5,"waste_volume":12.2,"zone_type":"Campus"}}"#;
        let rows = popup_rows(feature).unwrap();
        assert_eq!(rows[1].value, "0.87");
        assert_eq!(rows[3].value, "1000 /km²");
    }

    #[test]
    fn popup_refuses_invalid_levels() {
        let feature = r#"{"type":"Feature","geometry":null,
            "properties":{"risk_level":"Severe","risk_score":0.5,"pop_density":1,"waste_volume":1,"zone_type":"Campus"}}"#;
        assert!(popup_rows(feature).unwrap_err().contains("Severe"));
    }

    #[test]
    fn request_body_names_the_bad_field() {
        let err = request_body(
            r#"{"pop_density":-1,"dist_tps":500,"waste_volume":50,"road_access":"Good","zone_type":"Market"}"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "pop_density");

        let body = request_body(
            r#"{"pop_density":10,"dist_to_disposal":500,"waste_volume":50,"road_access":"Good","zone_type":"Market"}"#,
        )
        .unwrap();
        assert!(body.contains(r#""dist_tps":500.0"#));
    }

    #[test]
    fn unknown_level_fails_loudly() {
        assert!(parse_level("Critical").is_err());
        assert_eq!(parse_level("High").unwrap(), RiskLevel::High);
    }

    #[test]
    fn completion_names() {
        assert_eq!(completion_name(Completion::Discarded), "discarded");
    }
}
