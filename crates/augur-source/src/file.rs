use crate::error::SourceError;
use augur_core::Comment;
use serde::Deserialize;
use std::path::Path;

/// Either a bare string or an object with at least `text`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawComment {
    Text(String),
    Record {
        text: String,
        #[serde(default)]
        level: u32,
        author: Option<String>,
        time: Option<String>,
    },
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        match raw {
            RawComment::Text(text) => Comment::from_text(text),
            RawComment::Record {
                text,
                level,
                author,
                time,
            } => {
                let base = Comment::from_text(text);
                Comment {
                    level,
                    author: author.unwrap_or(base.author),
                    time: time.unwrap_or(base.time),
                    text: base.text,
                }
            }
        }
    }
}

/// Read comments from a JSON array file. Blank comments are dropped.
pub fn load_comments(path: &Path) -> Result<Vec<Comment>, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Vec<RawComment> =
        serde_json::from_str(&content).map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let comments: Vec<Comment> = raw
        .into_iter()
        .map(Comment::from)
        .filter(|c| !c.text.trim().is_empty())
        .collect();
    tracing::info!(path = %path.display(), comments = comments.len(), "loaded comments");
    Ok(comments)
}
