//! Normalization of raw model output into a [`Verdict`].
//!
//! Structural problems (no JSON object at all) are errors. Field-level
//! problems are not: missing or mistyped fields fall back to empty values
//! and `0.0`, and the acceptance gate on `innovation_score` does the rest.

use hnscout_core::{ItemKind, Verdict};
use serde_json::{Map, Value};

use crate::error::ClassifyError;

const THINK_CLOSE: &str = "</think>";

/// Parse a model response body into a validated [`Verdict`].
///
/// Markdown code fences around the JSON are tolerated, as is leading or
/// trailing prose: the outermost `{...}` span is parsed. A reasoning preamble
/// closed by `</think>` is dropped first.
///
/// # Errors
///
/// Returns [`ClassifyError::MalformedResponse`] if no JSON object can be
/// extracted from `text`.
pub fn parse_verdict(text: &str) -> Result<Verdict, ClassifyError> {
    let body = extract_object(text).ok_or_else(|| {
        ClassifyError::MalformedResponse(format!("no JSON object in response: {}", preview(text)))
    })?;

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClassifyError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let Value::Object(fields) = value else {
        return Err(ClassifyError::MalformedResponse(
            "response is not a JSON object".to_string(),
        ));
    };

    Ok(normalize(&fields))
}

fn normalize(fields: &Map<String, Value>) -> Verdict {
    let kind = first_present(fields, &["type", "kind"])
        .and_then(Value::as_str)
        .map_or(ItemKind::Other, ItemKind::from_label);

    Verdict {
        kind,
        confidence: number(fields.get("confidence")).clamp(0.0, 1.0),
        name: text(first_present(fields, &["name", "startup_name"])),
        category: text(fields.get("category")),
        stage: text(fields.get("stage")),
        summary: text(fields.get("summary")),
        key_features: string_list(fields.get("key_features")),
        target_audience: text(fields.get("target_audience")),
        technical_details: text(fields.get("technical_details")),
        business_model: text(fields.get("business_model")),
        founder_info: text(fields.get("founder_info")),
        funding_stage: text(fields.get("funding_stage")),
        why_interesting: text(fields.get("why_interesting")),
        innovation_score: number(fields.get("innovation_score")).clamp(0.0, 10.0),
        coolness_factor: text(fields.get("coolness_factor")),
    }
}

fn extract_object(text: &str) -> Option<&str> {
    let text = text
        .rfind(THINK_CLOSE)
        .map_or(text, |at| &text[at + THINK_CLOSE.len()..]);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_null())
}

fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}
