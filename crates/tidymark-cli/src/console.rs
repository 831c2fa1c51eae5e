//! Human-facing progress lines for a cleanup run.

use tidymark::model::{Action, truncate_chars};
use tidymark::pipeline::{CleanupEvent, EventHandler};

const BATCH_RULE: &str = "============================================================";

/// Prints orchestrator events to stdout in the tool's own voice.
pub struct ConsoleHandler;

impl EventHandler for ConsoleHandler {
    fn on_event(&self, event: &CleanupEvent<'_>) {
        if let Some(line) = describe(event) {
            println!("{line}");
        }
    }
}

/// The console line for an event, if it has one.
pub fn describe(event: &CleanupEvent<'_>) -> Option<String> {
    let line = match event {
        CleanupEvent::SessionResumed {
            page, processed, ..
        } => format!(
            "📂 Resuming from previous session: {processed} already processed, page {}",
            page + 1
        ),
        CleanupEvent::FreshStart { .. } => "🆕 Starting fresh session".to_string(),
        CleanupEvent::PageSkipped { page, fetched } => format!(
            "📄 Page {}: All {fetched} bookmarks already processed, skipping...",
            page + 1
        ),
        CleanupEvent::PageStarted {
            page,
            fetched,
            unprocessed,
            ..
        } => format!(
            "\n📦 Processing page {} - {unprocessed} new bookmarks (of {fetched} total)",
            page + 1
        ),
        CleanupEvent::BatchStarted {
            page_batch,
            page_batches,
            size,
            ..
        } => format!(
            "\n{BATCH_RULE}\n📋 BATCH {page_batch} of {page_batches} ({size} bookmarks)\n{BATCH_RULE}"
        ),
        CleanupEvent::AnalysisStarted { .. } => {
            "🤖 Getting recommendations...\n    (Based on: title, URL, domain, and excerpt - not full content)"
                .to_string()
        }
        CleanupEvent::BatchSkipped { .. } => "⏭️  Skipping all items in this batch".to_string(),
        CleanupEvent::ActionsExecuting { count, .. } => {
            format!("\n🚀 EXECUTING {count} ACTIONS...")
        }
        CleanupEvent::ActionApplied {
            title,
            action,
            dry_run,
        } => {
            let prefix = if *dry_run { "[DRY-RUN] " } else { "" };
            let title = truncate_chars(title, 50);
            match action {
                Action::Delete => format!("    ❌ {prefix}DELETED: {title}"),
                Action::Archive => format!("    📦 {prefix}ARCHIVED: {title}"),
                Action::Move { target } => format!("    🔄 {prefix}MOVED to {target}: {title}"),
                Action::Keep => return None,
            }
        }
        CleanupEvent::ActionFailed {
            title,
            action,
            reason,
        } => format!(
            "    ⚠️  Failed to {}: {} ({reason})",
            action.label().to_lowercase(),
            truncate_chars(title, 50)
        ),
        CleanupEvent::Progress {
            total_processed,
            rate_per_min,
        } => format!(
            "\n📊 Session Progress: {total_processed} total processed | Rate: {rate_per_min:.1}/min"
        ),
        CleanupEvent::FetchFailed { page, error } => format!(
            "⚠️  Could not fetch page {}: {error}\n💾 Progress saved. Run again to retry from this page.",
            page + 1
        ),
        CleanupEvent::PageLimitReached { .. } => "⚠️  Reached page limit, stopping".to_string(),
        CleanupEvent::Completed {
            processed_this_run,
            total_processed,
            ..
        } => format!(
            "\n✅ Completed collection\n   Total bookmarks processed this session: {processed_this_run}\n   Total bookmarks processed overall: {total_processed}"
        ),
        CleanupEvent::Interrupted { .. } => "\n\n⏹️  Processing interrupted - progress saved!".to_string(),
        CleanupEvent::SelectionDiscarded { .. }
        | CleanupEvent::Checkpointed { .. }
        | CleanupEvent::BreakSuggested { .. }
        | CleanupEvent::PageRefetch { .. } => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_one_based_on_screen() {
        let line = describe(&CleanupEvent::PageSkipped {
            page: 0,
            fetched: 50,
        })
        .unwrap();
        assert!(line.starts_with("📄 Page 1:"));
    }

    #[test]
    fn applied_actions_mark_dry_runs() {
        let action = Action::move_to("Gaming");
        let line = describe(&CleanupEvent::ActionApplied {
            title: "Zelda guide",
            action: &action,
            dry_run: true,
        })
        .unwrap();
        assert_eq!(line, "    🔄 [DRY-RUN] MOVED to Gaming: Zelda guide");
    }

    #[test]
    fn bookkeeping_events_stay_quiet() {
        assert!(describe(&CleanupEvent::PageRefetch { page: 0, removed: 2 }).is_none());
        assert!(describe(&CleanupEvent::BreakSuggested { processed_this_run: 25 }).is_none());
    }
}
