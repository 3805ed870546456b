//! Prompt templates for each model-backed stage
//!
//! Templates use `{name}` slots. Braces that are not a known slot are
//! left untouched, so JSON examples in the body need no escaping.

/// A named prompt with `{slot}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub body: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, body: &'static str) -> Self {
        Self { name, body }
    }

    /// Substitute slots in a single pass; substituted text is never rescanned
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let slot = after.find('}').and_then(|close| {
                let name = &after[..close];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (close, *value))
            });
            match slot {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

pub static FILTER_NOISY_COMMENTS: PromptTemplate = PromptTemplate::new(
    "filter_noisy_comments",
    r#"
You are an expert at identifying relevant comments in an online discussion. Your task is to determine if each comment is "noisy" or "not noisy" based on these criteria:

**Noisy Comments:**
*   Sarcastic or joking comments.
*   Meta-comments about the discussion itself or other comments.
*   Comments that only contain URLs.
*   Comments that are generic statements or observations unrelated to specific future events.
*   Short replies or exchanges not directly making a prediction.
*   Comments expressing opinions or beliefs without predicting a concrete future outcome.

**Not Noisy Comments:**
*   Comments that make a *specific and testable* prediction about a future event or outcome.
*   Comments that predict a concrete future state related to real-world things or trends.

Respond with a JSON object in the following format:
{
  "is_noisy": [<boolean>, <boolean>, ...]
}

where the booleans correspond to the input comments in order and `true` means noisy, `false` is not noisy.

Do not include any explanation or code.

Comments to Evaluate:
{comments}
"#,
);

pub static EVALUATE_PREDICTIONS: PromptTemplate = PromptTemplate::new(
    "evaluate_predictions",
    r#"
You are an expert in extracting and evaluating predictions made by the participants about the future. Given a list of comments, your task is to extract unique predictions from each comment and analyze the likelihood of each prediction coming true. For each prediction you find, provide a **complete** JSON response in the following format:

{
    "predictions": [
        {
            "prediction": "verbatim prediction from the comment",
            "probability": 0.75,
            "justification": "Brief explanation of the probability assessment"
        }
    ]
}

The probability is your estimate between 0 and 1.

Comments to Evaluate:
{comments}
"#,
);

pub static IDENTIFY_THEMES: PromptTemplate = PromptTemplate::new(
    "identify_themes",
    r#"
You are an expert at identifying themes and patterns in texts. Given a list of statements, identify the major themes or categories they fall into.

For each theme, provide:
1. A short descriptive name
2. A brief summary of the statements denoting what the theme encompasses
3. A list of statements that fall under this theme

If the statements cannot be easily summarized into one specific theme, group them under a theme called "Other", and provide a description that explains why they don't fit into a cohesive theme.

Respond with a JSON object in the following format:
{
    "themes": [
        {
            "theme": "Theme name",
            "summary": "Brief theme description",
            "predictions": ["prediction 1", "prediction 2"]
        }
    ]
}

Predictions and evaluations:
{predictions}
"#,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_slot() {
        let t = PromptTemplate::new("t", "Comments:\n{comments}\nend");
        assert_eq!(t.render(&[("comments", "a\nb")]), "Comments:\na\nb\nend");
    }

    #[test]
    fn test_render_leaves_json_braces() {
        let t = PromptTemplate::new("t", "{\n  \"x\": [1]\n}\n{comments}");
        let out = t.render(&[("comments", "c")]);
        assert_eq!(out, "{\n  \"x\": [1]\n}\nc");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let t = PromptTemplate::new("t", "{comments}");
        let out = t.render(&[("comments", "{comments} stays")]);
        assert_eq!(out, "{comments} stays");
    }

    #[test]
    fn test_unknown_slot_is_kept() {
        let t = PromptTemplate::new("t", "{other} {comments}");
        assert_eq!(t.render(&[("comments", "x")]), "{other} x");
    }

    #[test]
    fn test_builtin_templates_have_their_slots() {
        assert!(FILTER_NOISY_COMMENTS.body.contains("{comments}"));
        assert!(EVALUATE_PREDICTIONS.body.contains("{comments}"));
        assert!(IDENTIFY_THEMES.body.contains("{predictions}"));
        assert!(FILTER_NOISY_COMMENTS.body.contains("\"is_noisy\""));
    }
}
