use regex::Regex;
use std::sync::OnceLock;

static PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

/// Plain text from a comment's HTML body: tags dropped, entities decoded,
/// whitespace collapsed to single spaces
pub fn html_to_text(html: &str) -> String {
    let paragraph_re = PARAGRAPH_RE.get_or_init(|| Regex::new(r"(?i)<\s*(p|br)\s*/?>").unwrap());
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());
    let whitespace_re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let text = paragraph_re.replace_all(html, " ");
    let text = tag_re.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    whitespace_re.replace_all(&text, " ").trim().to_string()
}
