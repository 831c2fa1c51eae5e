//! Parsing the interactive collection and session pickers.

use tidymark::model::Collection;
use tidymark::session::SessionSummary;

/// Answer to "Which collection would you like to process?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChoice {
    Selected(usize),
    Quit,
    NotFound,
}

/// A one-based number, or a case-insensitive piece of a collection name.
pub fn parse_collection_choice(input: &str, collections: &[Collection]) -> CollectionChoice {
    let choice = input.trim();
    if matches!(choice.to_lowercase().as_str(), "quit" | "exit" | "q") {
        return CollectionChoice::Quit;
    }
    if let Ok(n) = choice.parse::<usize>()
        && (1..=collections.len()).contains(&n)
    {
        return CollectionChoice::Selected(n - 1);
    }
    let needle = choice.to_lowercase();
    if needle.is_empty() {
        return CollectionChoice::NotFound;
    }
    collections
        .iter()
        .position(|c| c.title.to_lowercase().contains(&needle))
        .map_or(CollectionChoice::NotFound, CollectionChoice::Selected)
}

/// Answer to the `--resume` picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChoice {
    Resume(usize),
    New,
    Invalid,
}

pub fn parse_session_choice(input: &str, sessions: usize) -> SessionChoice {
    let choice = input.trim().to_lowercase();
    if matches!(choice.as_str(), "new" | "fresh" | "n") {
        return SessionChoice::New;
    }
    match choice.parse::<usize>() {
        Ok(n) if (1..=sessions).contains(&n) => SessionChoice::Resume(n - 1),
        _ => SessionChoice::Invalid,
    }
}

/// `  📁 Inbox (12 items) - ID: 42`
pub fn collection_listing(collection: &Collection) -> String {
    format!(
        "  📁 {} ({} items) - ID: {}",
        collection.title, collection.count, collection.id
    )
}

/// Two lines describing a resumable session, numbered from 1.
pub fn session_listing(number: usize, session: &SessionSummary) -> String {
    let minutes = if session.stats.session_time > 0.0 {
        format!(" | {:.1}min", session.stats.session_time / 60.0)
    } else {
        String::new()
    };
    let mode = if session.dry_run { " (dry run)" } else { "" };
    format!(
        "{number:2}. {}{mode}\n    📊 {} processed | {} deleted | {} moved{minutes}\n    📅 Last updated: {}",
        session.collection_name,
        session.processed_count,
        session.stats.deleted,
        session.stats.moved,
        session.last_updated.format("%Y-%m-%d %H:%M"),
    )
}
