//! Recovers structured output from free-form model text

use crate::schema::ResponseSchema;
use regex::{Captures, Regex};
use std::sync::OnceLock;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();
static CODE_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static LINE_COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static TRAILING_COMMA_RE: OnceLock<Regex> = OnceLock::new();
static ESCAPE_RE: OnceLock<Regex> = OnceLock::new();

fn fence() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\n?(.*?)```").unwrap())
}

fn code_block() -> &'static Regex {
    CODE_BLOCK_RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap())
}

/// `//` only counts as a comment at line start or after a separator, so
/// `http://` inside strings survives
fn line_comment() -> &'static Regex {
    LINE_COMMENT_RE.get_or_init(|| Regex::new(r"(?m)(^|[\s,\[{])//[^\n]*").unwrap())
}

fn block_comment() -> &'static Regex {
    BLOCK_COMMENT_RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap())
}

fn trailing_comma() -> &'static Regex {
    TRAILING_COMMA_RE.get_or_init(|| Regex::new(r",\s*([}\]])").unwrap())
}

fn escape() -> &'static Regex {
    ESCAPE_RE.get_or_init(|| Regex::new(r"(?s)\\(.)").unwrap())
}

/// Remove markdown code fences, keeping their contents
pub fn strip_fences(text: &str) -> String {
    fence().replace_all(text, "${1}").into_owned()
}

/// Drop prose before the first `{`/`[` and after the last `}`/`]`
pub fn strip_prose(text: &str) -> &str {
    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        _ => text.trim(),
    }
}

/// Fix the syntax slips models commonly make in JSON
pub fn normalize(text: &str) -> String {
    let text = text.replace('\'', "\"");
    let text = line_comment().replace_all(&text, "${1}");
    let text = block_comment().replace_all(&text, "");
    let text = escape().replace_all(&text, |caps: &Captures| {
        let c = &caps[1];
        if matches!(c, "/" | "\"" | "\\" | "b" | "f" | "n" | "r" | "t" | "u") {
            caps[0].to_string()
        } else {
            c.to_string()
        }
    });
    let text = trailing_comma().replace_all(&text, "${1}");
    text.trim().to_string()
}

/// The full text-level repair: fences, prose, then normalization
pub fn repair(raw: &str) -> String {
    normalize(strip_prose(&strip_fences(raw)))
}

fn parse_candidate<S: ResponseSchema>(text: &str, schema: &S) -> Option<S::Output> {
    let stripped = strip_fences(text);
    let cleaned = strip_prose(&stripped);

    if let Ok(value) = serde_json::from_str(cleaned) {
        if let Some(output) = schema.validate(&value) {
            return Some(output);
        }
    }

    let normalized = normalize(cleaned);
    let value = serde_json::from_str(&normalized).ok()?;
    schema.validate(&value)
}

/// Parse a raw model response against a schema. Returns None rather than
/// guessing when nothing valid can be recovered.
pub fn parse<S: ResponseSchema>(raw: &str, schema: &S) -> Option<S::Output> {
    if let Some(output) = parse_candidate(raw, schema) {
        return Some(output);
    }

    for caps in code_block().captures_iter(raw) {
        if let Some(output) = parse_candidate(&caps[1], schema) {
            tracing::debug!(schema = schema.name(), "recovered from code block");
            return Some(output);
        }
    }

    tracing::debug!(schema = schema.name(), "response could not be parsed");
    None
}
