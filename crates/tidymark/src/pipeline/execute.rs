//! Applying approved actions to the bookmark source.

use super::events::{CleanupEvent, EventHandler};
use crate::model::{Action, Approval, Bookmark, Collection, CollectionId, Decision};
use crate::session::StatsDelta;
use crate::source::BookmarkSource;

const NO_RECOMMENDATION: &str = "no recommendation received";

/// Exactly one decision per bookmark: pad with KEEP, drop extras.
pub fn align_decisions(mut decisions: Vec<Decision>, len: usize) -> Vec<Decision> {
    decisions.truncate(len);
    decisions.resize_with(len, || Decision::keep(NO_RECOMMENDATION));
    decisions
}

/// Sort approvals by index, keep the first of any duplicate, and drop
/// out-of-range or KEEP entries.
pub fn normalize_approvals(
    mut approvals: Vec<Approval>,
    batch_len: usize,
    events: &dyn EventHandler,
) -> Vec<Approval> {
    approvals.sort_by_key(|a| a.index);
    let mut kept: Vec<Approval> = Vec::with_capacity(approvals.len());
    for approval in approvals {
        let reason = if approval.index >= batch_len {
            Some("index outside the batch")
        } else if approval.action.is_keep() {
            Some("KEEP needs no action")
        } else if kept.last().is_some_and(|k| k.index == approval.index) {
            Some("duplicate selection")
        } else {
            None
        };
        match reason {
            Some(reason) => events.on_event(&CleanupEvent::SelectionDiscarded {
                index: approval.index,
                reason,
            }),
            None => kept.push(approval),
        }
    }
    kept
}

/// What executing a batch's approvals did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub delta: StatsDelta,
    /// Bookmarks that actually left the collection being cleaned.
    pub removed: usize,
}

/// Where approved actions are applied.
pub struct ExecutionTarget<'a> {
    pub source: &'a dyn BookmarkSource,
    pub collections: &'a [Collection],
    pub current_collection_id: CollectionId,
    pub archive_collection_id: Option<CollectionId>,
    pub dry_run: bool,
}

/// Apply each approval in batch order.
///
/// Every approval counts as processed, plus exactly one of deleted,
/// archived, moved, or errors. In dry-run mode nothing is sent to the
/// source and every action that could be resolved succeeds.
pub async fn apply_approvals(
    target: &ExecutionTarget<'_>,
    batch: &[Bookmark],
    approvals: &[Approval],
    events: &dyn EventHandler,
) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for approval in approvals {
        let Some(bookmark) = batch.get(approval.index) else {
            continue;
        };
        let result = apply_one(target, bookmark, &approval.action).await;
        outcome.delta.processed += 1;

        match result {
            Ok(destination) => {
                match approval.action {
                    Action::Delete => outcome.delta.deleted += 1,
                    Action::Archive => outcome.delta.archived += 1,
                    Action::Move { .. } => outcome.delta.moved += 1,
                    Action::Keep => {}
                }
                if !target.dry_run && destination != Some(target.current_collection_id) {
                    outcome.removed += 1;
                }
                events.on_event(&CleanupEvent::ActionApplied {
                    title: &bookmark.title,
                    action: &approval.action,
                    dry_run: target.dry_run,
                });
            }
            Err(reason) => {
                outcome.delta.errors += 1;
                events.on_event(&CleanupEvent::ActionFailed {
                    title: &bookmark.title,
                    action: &approval.action,
                    reason: &reason,
                });
            }
        }
    }
    outcome
}

/// `Ok(Some(id))` for a move into collection `id`, `Ok(None)` for a delete.
async fn apply_one(
    target: &ExecutionTarget<'_>,
    bookmark: &Bookmark,
    action: &Action,
) -> Result<Option<CollectionId>, String> {
    match action {
        Action::Keep => Ok(Some(target.current_collection_id)),
        Action::Delete => {
            if !target.dry_run {
                target
                    .source
                    .delete(bookmark.id)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Ok(None)
        }
        Action::Archive => {
            let archive = target
                .archive_collection_id
                .ok_or_else(|| "no archive collection configured".to_string())?;
            move_to(target, bookmark, archive).await
        }
        Action::Move { target: name } => {
            let destination = target
                .source
                .resolve_collection_by_name(target.collections, name)
                .ok_or_else(|| format!("no collection matches {name:?}"))?;
            move_to(target, bookmark, destination).await
        }
    }
}

async fn move_to(
    target: &ExecutionTarget<'_>,
    bookmark: &Bookmark,
    destination: CollectionId,
) -> Result<Option<CollectionId>, String> {
    if !target.dry_run {
        target
            .source
            .move_to_collection(bookmark.id, destination)
            .await
            .map_err(|e| e.to_string())?;
    }
    Ok(Some(destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::events::NoopHandler;

    #[test]
    fn align_pads_and_truncates() {
        let padded = align_decisions(vec![Decision::new(Action::Delete, "x")], 3);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[1], Decision::keep(NO_RECOMMENDATION));

        let trimmed = align_decisions(vec![Decision::keep("a"); 5], 2);
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn normalize_sorts_dedupes_and_filters() {
        let approvals = vec![
            Approval::new(2, Action::Delete),
            Approval::new(0, Action::Archive),
            Approval::new(2, Action::move_to("X")),
            Approval::new(1, Action::Keep),
            Approval::new(7, Action::Delete),
        ];
        let normalized = normalize_approvals(approvals, 3, &NoopHandler);
        assert_eq!(
            normalized,
            vec![
                Approval::new(0, Action::Archive),
                Approval::new(2, Action::Delete),
            ]
        );
    }
}
