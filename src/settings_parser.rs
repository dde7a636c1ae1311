//! Backend metadata ⇄ problem settings.
//!
//! Settings travel separately from the problem body: the backend persists
//! a flat snake_case metadata map next to the OLX. Parsing is lenient by
//! contract. A value that does not match a recognized enum member is
//! dropped without error so a stale or hand-edited map can never wedge
//! the editor, while numbers are normalized against the platform default
//! map so "use the default" and "explicitly the same as the default" stay
//! distinguishable.

use serde_json::{Map, Value};

use crate::olx_tree;
use crate::types::{
    Attempts, RandomizationType, Scoring, Settings, ShowAnswer, ShowAnswerType,
    SETTINGS_OLX_ATTRIBUTES,
};

/// Build the settings portion of a `ProblemState` from persisted metadata.
/// Body-derived fields (hints, solution, tolerance) are left at their
/// defaults; the OLX parser owns those.
pub fn parse_settings(metadata: &Map<String, Value>, defaults: &Map<String, Value>) -> Settings {
    let mut settings = Settings::default();
    settings.scoring = parse_scoring_settings(metadata, defaults);
    settings.show_answer = parse_show_answer(metadata);

    if let Some(raw) = value_as_str(metadata.get("rerandomize")) {
        match RandomizationType::from_key(&raw) {
            Some(randomization) => settings.randomization = Some(randomization),
            None => tracing::debug!("unrecognized rerandomize value dropped: {:?}", raw),
        }
    }
    if let Some(value) = value_as_bool(metadata.get("show_reset_button")) {
        settings.show_reset_button = Some(value);
    }
    if let Some(seconds) = value_as_i64(metadata.get("submission_wait_seconds")) {
        settings.time_between = seconds.max(0);
    }
    settings
}

/// Attempt-count normalization. A block-level count equal to the platform
/// default collapses to `None` so the block keeps tracking the platform
/// when the default later changes; `unlimited` only holds when neither
/// side sets a limit.
pub fn parse_scoring_settings(
    metadata: &Map<String, Value>,
    defaults: &Map<String, Value>,
) -> Scoring {
    let weight = value_as_f64(metadata.get("weight")).unwrap_or(1.0);
    let raw = value_as_i64(metadata.get("max_attempts")).map(|n| n.max(0));
    let default = value_as_i64(defaults.get("max_attempts")).map(|n| n.max(0));

    let attempts = match (raw, default) {
        (None, None) => Attempts {
            number: None,
            unlimited: true,
        },
        (Some(n), Some(d)) if n == d => Attempts {
            number: None,
            unlimited: false,
        },
        (Some(n), _) => Attempts {
            number: Some(n),
            unlimited: false,
        },
        (None, Some(_)) => Attempts {
            number: None,
            unlimited: false,
        },
    };
    Scoring { weight, attempts }
}

pub fn parse_show_answer(metadata: &Map<String, Value>) -> ShowAnswer {
    let on = value_as_str(metadata.get("showanswer")).and_then(|raw| {
        let parsed = ShowAnswerType::from_key(&raw);
        if parsed.is_none() {
            tracing::debug!("unrecognized showanswer value dropped: {:?}", raw);
        }
        parsed
    });
    let after_attempts =
        value_as_i64(metadata.get("attempts_before_showanswer_button")).unwrap_or(0);
    ShowAnswer { on, after_attempts }
}

/// The inverse direction: the metadata map handed back to the backend at
/// save time. `max_attempts` is written as explicit null when the block
/// follows the platform default.
pub fn settings_to_metadata(settings: &Settings) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("weight".to_string(), json_number(settings.scoring.weight));
    metadata.insert(
        "max_attempts".to_string(),
        match settings.scoring.attempts.number {
            Some(n) => Value::Number(n.into()),
            None => Value::Null,
        },
    );
    if let Some(on) = settings.show_answer.on {
        metadata.insert(
            "showanswer".to_string(),
            Value::String(on.as_key().to_string()),
        );
    }
    metadata.insert(
        "attempts_before_showanswer_button".to_string(),
        Value::Number(settings.show_answer.after_attempts.into()),
    );
    if let Some(randomization) = settings.randomization {
        metadata.insert(
            "rerandomize".to_string(),
            Value::String(randomization.as_key().to_string()),
        );
    }
    if let Some(show_reset) = settings.show_reset_button {
        metadata.insert("show_reset_button".to_string(), Value::Bool(show_reset));
    }
    metadata.insert(
        "submission_wait_seconds".to_string(),
        Value::Number(settings.time_between.into()),
    );
    metadata
}

/// Settings attributes as written on the `<problem>` element itself.
/// Only used to detect divergence between sidebar-configured settings and
/// hand-edited raw OLX; `None` when the text does not parse as a problem.
pub fn olx_settings_metadata(olx: &str) -> Option<Map<String, Value>> {
    let root = olx_tree::parse_document(olx).ok()?;
    if root.name != "problem" {
        return None;
    }
    let mut metadata = Map::new();
    for (key, _) in &root.attributes {
        if SETTINGS_OLX_ATTRIBUTES.contains(&key.as_str()) {
            if let Some(value) = root.attr_unescaped(key) {
                metadata.insert(key.clone(), Value::String(value));
            }
        }
    }
    Some(metadata)
}

/// Re-derive settings from live OLX attribute text.
pub fn parse_settings_from_olx(olx: &str, defaults: &Map<String, Value>) -> Option<Settings> {
    olx_settings_metadata(olx).map(|metadata| parse_settings(&metadata, defaults))
}

fn value_as_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Metadata numbers arrive as JSON numbers from the backend but as strings
/// when re-derived from OLX attributes; both shapes are accepted.
fn value_as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
