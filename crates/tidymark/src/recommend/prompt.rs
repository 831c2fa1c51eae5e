//! Prompt template loading and rendering.
//!
//! Templates use `{name}` placeholders (`{{` and `}}` for literal braces):
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{bookmark_count}` | number of bookmarks in the batch |
//! | `{current_collection_name}` | name of the collection being cleaned |
//! | `{current_collection_info}` | `CURRENT COLLECTION: ...` line, or empty |
//! | `{batch_info}` | numbered bookmark list |
//! | `{collection_info}` | `AVAILABLE COLLECTIONS:` list, or empty |

use crate::model::{Bookmark, Collection};
use std::fmt::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable naming a file that replaces the bundled template.
pub const PROMPT_FILE_ENV: &str = "RAINDROP_PROMPT_FILE";

/// The bundled template.
pub const DEFAULT_TEMPLATE: &str = include_str!("default_prompt.txt");

const EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    /// The template named by `RAINDROP_PROMPT_FILE`, or the bundled one.
    /// An unreadable override falls back to the bundled template.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(PROMPT_FILE_ENV) else {
            return Self::default();
        };
        match Self::from_file(&path) {
            Ok(template) => {
                debug!("Using prompt template from {path}");
                template
            }
            Err(e) => {
                warn!("Cannot read prompt template {path}: {e}; using the bundled one");
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Render the prompt for one batch.
    pub fn render(
        &self,
        bookmarks: &[Bookmark],
        collections: &[Collection],
        current_collection: &str,
    ) -> String {
        let current_info = if current_collection.is_empty() {
            String::new()
        } else {
            format!("\nCURRENT COLLECTION: {current_collection}\n")
        };
        let count = bookmarks.len().to_string();
        let batch = batch_info(bookmarks);
        let collection = collection_info(collections, current_collection);

        fill(
            &self.text,
            &[
                ("bookmark_count", count.as_str()),
                ("current_collection_name", current_collection),
                ("current_collection_info", current_info.as_str()),
                ("batch_info", batch.as_str()),
                ("collection_info", collection.as_str()),
            ],
        )
    }
}

/// Numbered bookmark list: title, domain, date, URL, and a short excerpt.
pub fn batch_info(bookmarks: &[Bookmark]) -> String {
    let mut out = String::new();
    for (i, b) in bookmarks.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. [{}] - {} - {}\n   URL: {}\n",
            i + 1,
            b.title,
            b.domain,
            b.created_date(),
            b.link
        );
        if !b.excerpt.is_empty() {
            let excerpt: String = b.excerpt.chars().take(EXCERPT_CHARS).collect();
            let _ = writeln!(out, "   Content: {excerpt}");
        }
        out.push('\n');
    }
    out
}

/// `AVAILABLE COLLECTIONS:` list with item counts, marking the current one.
pub fn collection_info(collections: &[Collection], current_collection: &str) -> String {
    if collections.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nAVAILABLE COLLECTIONS:\n");
    for c in collections {
        let marker = if !current_collection.is_empty() && c.title == current_collection {
            " ← CURRENT"
        } else {
            ""
        };
        let _ = writeln!(out, "- {} ({} items){marker}", c.title, c.count);
    }
    out
}

/// Substitute `{name}` placeholders. Unknown placeholders are left as-is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        let (before, tail) = rest.split_at(pos);
        out.push_str(before);

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{')
            && let Some((name, remaining)) = after.split_once('}')
            && let Some((_, value)) = vars.iter().find(|(key, _)| *key == name)
        {
            out.push_str(value);
            rest = remaining;
        } else {
            // Lone brace or unknown placeholder: copy the brace through.
            let (brace, after) = tail.split_at(1);
            out.push_str(brace);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}
