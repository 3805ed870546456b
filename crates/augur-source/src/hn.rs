use crate::error::SourceError;
use crate::html::html_to_text;
use augur_core::Comment;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const ALGOLIA_ITEMS_URL: &str = "https://hn.algolia.com/api/v1/items";

/// Thread analysed when no item is given
pub const DEFAULT_ITEM_ID: u64 = 42490343;

/// Node of the Algolia items tree
#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    author: Option<String>,
    text: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    children: Vec<Item>,
}

pub struct HackerNewsSource {
    client: Client,
    base_url: String,
}

impl HackerNewsSource {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: ALGOLIA_ITEMS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Every comment under an item in thread order. Failures are logged and
    /// yield an empty list.
    pub fn fetch(&self, item_id: u64) -> Vec<Comment> {
        match self.try_fetch(item_id) {
            Ok(comments) => {
                tracing::info!(item_id, comments = comments.len(), "fetched thread");
                comments
            }
            Err(e) => {
                tracing::warn!(item_id, error = %e, "failed to fetch thread");
                Vec::new()
            }
        }
    }

    pub fn try_fetch(&self, item_id: u64) -> Result<Vec<Comment>, SourceError> {
        let url = format!("{}/{}", self.base_url, item_id);
        let item: Item = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(flatten(&item))
    }
}

/// Depth-first walk below the root; direct replies to the story are level 0
fn flatten(root: &Item) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut stack: Vec<(&Item, u32)> = root.children.iter().rev().map(|c| (c, 0)).collect();

    while let Some((item, level)) = stack.pop() {
        stack.extend(item.children.iter().rev().map(|c| (c, level + 1)));

        if item.kind.as_deref().is_some_and(|k| k != "comment") {
            continue;
        }
        let text = item.text.as_deref().map(html_to_text).unwrap_or_default();
        if text.is_empty() {
            continue;
        }
        let base = Comment::from_text(text);
        comments.push(Comment {
            level,
            author: item.author.clone().unwrap_or(base.author),
            time: item.created_at.clone().unwrap_or(base.time),
            text: base.text,
        });
    }
    comments
}
