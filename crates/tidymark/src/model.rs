//! Bookmarks, collections, and the per-bookmark decisions made about them.

use std::fmt;

/// Raindrop identifier of a single bookmark.
pub type BookmarkId = i64;

/// Raindrop identifier of a collection.
pub type CollectionId = i64;

// ── Bookmark ───────────────────────────────────────────────────────

/// A bookmark as returned by the bookmark source. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub title: String,
    pub link: String,
    pub domain: String,
    pub excerpt: String,
    /// ISO-8601 creation timestamp, as sent by the service.
    pub created: String,
    pub collection_id: Option<CollectionId>,
}

impl Bookmark {
    /// Minimal bookmark with only an id and a title.
    pub fn new(id: BookmarkId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            link: String::new(),
            domain: String::new(),
            excerpt: String::new(),
            created: String::new(),
            collection_id: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>, domain: impl Into<String>) -> Self {
        self.link = link.into();
        self.domain = domain.into();
        self
    }

    /// The `YYYY-MM-DD` part of the creation timestamp.
    pub fn created_date(&self) -> &str {
        let end = self
            .created
            .char_indices()
            .nth(10)
            .map_or(self.created.len(), |(i, _)| i);
        self.created.get(..end).unwrap_or_default()
    }
}

// ── Collection ─────────────────────────────────────────────────────

/// A named grouping of bookmarks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub count: u64,
}

impl Collection {
    pub fn new(id: CollectionId, title: impl Into<String>, count: u64) -> Self {
        Self {
            id,
            title: title.into(),
            count,
        }
    }
}

/// Resolve a collection by display name.
///
/// An exact case-insensitive title match always wins. Otherwise the first
/// collection whose title contains `name`, or is contained in it, is
/// returned. Blank names and blank titles never match by substring.
pub fn find_collection_by_name<'a>(
    collections: &'a [Collection],
    name: &str,
) -> Option<&'a Collection> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = collections
        .iter()
        .find(|c| c.title.trim().to_lowercase() == needle)
    {
        return Some(exact);
    }

    collections.iter().find(|c| {
        let title = c.title.trim().to_lowercase();
        !title.is_empty() && (title.contains(&needle) || needle.contains(&title))
    })
}

// ── Actions and decisions ──────────────────────────────────────────

/// What should happen to a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Keep,
    Delete,
    /// Move into the configured archive collection.
    Archive,
    /// Move into the collection whose display name is `target`.
    Move { target: String },
}

impl Action {
    pub fn move_to(target: impl Into<String>) -> Self {
        Action::Move {
            target: target.into(),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Action::Keep)
    }

    /// Upper-case tag used in prompts and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Keep => "KEEP",
            Action::Delete => "DELETE",
            Action::Archive => "ARCHIVE",
            Action::Move { .. } => "MOVE",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Action::Keep => "✅",
            Action::Delete => "❌",
            Action::Archive => "📦",
            Action::Move { .. } => "🔄",
        }
    }

    /// Move target, if this is a move.
    pub fn target(&self) -> Option<&str> {
        match self {
            Action::Move { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { target } => write!(f, "MOVE → {target}"),
            other => f.write_str(other.label()),
        }
    }
}

/// A recommendation for one bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    /// Advisory text shown to the reviewer. Never interpreted.
    pub reasoning: String,
}

impl Decision {
    pub fn new(action: Action, reasoning: impl Into<String>) -> Self {
        Self {
            action,
            reasoning: reasoning.into(),
        }
    }

    pub fn keep(reasoning: impl Into<String>) -> Self {
        Self::new(Action::Keep, reasoning)
    }
}

/// A reviewer-approved action for the bookmark at `index` within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub index: usize,
    pub action: Action,
}

impl Approval {
    pub fn new(index: usize, action: Action) -> Self {
        Self { index, action }
    }
}

/// Truncate to at most `max` characters, appending `...` when shortened.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collections() -> Vec<Collection> {
        vec![
            Collection::new(1, "Development", 40),
            Collection::new(2, "Gaming", 12),
            Collection::new(3, "Dev Tools", 7),
            Collection::new(4, "Archive", 300),
            Collection::new(5, "Dev", 3),
        ]
    }

    #[test]
    fn exact_match_beats_substring() {
        let cols = collections();
        // "Development" comes first and contains "dev".
        assert_eq!(find_collection_by_name(&cols, "DEV").unwrap().id, 5);
        assert_eq!(find_collection_by_name(&cols, "dev tools").unwrap().id, 3);
        assert_eq!(find_collection_by_name(&cols, "development").unwrap().id, 1);
    }

    #[test]
    fn substring_matches_either_direction() {
        let cols = collections();
        assert_eq!(find_collection_by_name(&cols, "gam").unwrap().id, 2);
        assert_eq!(
            find_collection_by_name(&cols, "Old Archive Stuff").unwrap().id,
            4
        );
    }

    #[test]
    fn no_match_and_blank_name_return_none() {
        let cols = collections();
        assert!(find_collection_by_name(&cols, "Recipes").is_none());
        assert!(find_collection_by_name(&cols, "   ").is_none());
        assert!(find_collection_by_name(&[], "Gaming").is_none());
    }

    #[test]
    fn action_display_includes_move_target() {
        assert_eq!(Action::move_to("Gaming").to_string(), "MOVE → Gaming");
        assert_eq!(Action::Delete.to_string(), "DELETE");
        assert_eq!(Action::move_to("X").target(), Some("X"));
        assert!(Action::default().is_keep());
    }

    #[test]
    fn created_date_handles_short_and_multibyte() {
        let mut b = Bookmark::new(1, "t");
        b.created = "2023-04-05T10:00:00Z".into();
        assert_eq!(b.created_date(), "2023-04-05");
        b.created = "2023".into();
        assert_eq!(b.created_date(), "2023");
    }

    #[test]
    fn truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("ééééééééééé", 6), "ééé...");
    }
}
