//! Structural validation of parsed model responses

use augur_core::Prediction;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Expected shape of a stage's response
pub trait ResponseSchema {
    type Output;

    fn name(&self) -> &'static str;

    /// Typed output if `value` has the right shape
    fn validate(&self, value: &Value) -> Option<Self::Output>;

    /// JSON schema handed to providers that support constrained decoding
    fn json_schema(&self) -> Value;
}

/// Find the payload: the value itself when it is an array, otherwise the
/// first of `keys` found at the top level or one or two objects deep
fn find_payload<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    if value.is_array() {
        return Some(value);
    }
    let obj = value.as_object()?;
    if let Some(found) = keys.iter().find_map(|k| obj.get(*k)) {
        return Some(found);
    }
    for child in obj.values().filter_map(Value::as_object) {
        if let Some(found) = keys.iter().find_map(|k| child.get(*k)) {
            return Some(found);
        }
        for grandchild in child.values().filter_map(Value::as_object) {
            if let Some(found) = keys.iter().find_map(|k| grandchild.get(*k)) {
                return Some(found);
            }
        }
    }
    None
}

/// Noise classification: one boolean per comment in the batch
#[derive(Debug, Clone, Copy)]
pub struct NoiseSchema {
    pub batch_size: usize,
}

impl NoiseSchema {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

impl ResponseSchema for NoiseSchema {
    type Output = Vec<bool>;

    fn name(&self) -> &'static str {
        "noise"
    }

    fn validate(&self, value: &Value) -> Option<Vec<bool>> {
        let items = find_payload(value, &["is_noisy", "results"])?.as_array()?;
        if items.len() != self.batch_size {
            return None;
        }
        items.iter().map(as_flag).collect()
    }

    fn json_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "is_noisy": {
                    "type": "array",
                    "items": {"type": "boolean"},
                    "minItems": self.batch_size,
                    "maxItems": self.batch_size
                }
            },
            "required": ["is_noisy"]
        })
    }
}

/// Extracted predictions with probability and justification
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionSchema;

fn as_probability(value: &Value) -> Option<f64> {
    let p = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    p.is_finite().then(|| p.clamp(0.0, 1.0))
}

fn as_prediction(value: &Value) -> Option<Prediction> {
    let obj = value.as_object()?;
    let text = obj.get("prediction")?.as_str()?;
    let probability = as_probability(obj.get("probability")?)?;
    let justification = obj.get("justification")?.as_str()?;
    Some(Prediction::new(text, probability, justification))
}

impl ResponseSchema for PredictionSchema {
    type Output = Vec<Prediction>;

    fn name(&self) -> &'static str {
        "predictions"
    }

    fn validate(&self, value: &Value) -> Option<Vec<Prediction>> {
        let items = find_payload(value, &["predictions"])?.as_array()?;
        items.iter().map(as_prediction).collect()
    }

    fn json_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "predictions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "prediction": {"type": "string"},
                            "probability": {"type": "number", "minimum": 0, "maximum": 1},
                            "justification": {"type": "string"}
                        },
                        "required": ["prediction", "probability", "justification"]
                    }
                }
            },
            "required": ["predictions"]
        })
    }
}

/// Theme as returned by the model, before matching against real predictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeLabel {
    pub theme: String,
    pub summary: String,
    pub predictions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeSchema;

fn as_theme(value: &Value) -> Option<ThemeLabel> {
    let obj = value.as_object()?;
    let theme = obj.get("theme")?.as_str()?;
    let summary = obj
        .get("summary")
        .or_else(|| obj.get("theme_summary"))?
        .as_str()?;
    let predictions = obj
        .get("predictions")?
        .as_array()?
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("prediction")?.as_str().map(String::from),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(ThemeLabel {
        theme: theme.to_string(),
        summary: summary.to_string(),
        predictions,
    })
}

impl ResponseSchema for ThemeSchema {
    type Output = Vec<ThemeLabel>;

    fn name(&self) -> &'static str {
        "themes"
    }

    fn validate(&self, value: &Value) -> Option<Vec<ThemeLabel>> {
        let items = find_payload(value, &["themes"])?.as_array()?;
        items.iter().map(as_theme).collect()
    }

    fn json_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "themes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "theme": {"type": "string"},
                            "summary": {"type": "string"},
                            "predictions": {"type": "array", "items": {"type": "string"}}
                        },
                        "required": ["theme", "summary", "predictions"]
                    }
                }
            },
            "required": ["themes"]
        })
    }
}
