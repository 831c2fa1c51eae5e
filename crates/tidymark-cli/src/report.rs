//! End-of-run statistics.

use std::fmt::Write;
use std::time::Duration;

use tidymark::session::SessionStats;

const RULE: &str = "============================================================";

/// What the final report shows.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub dry_run: bool,
    pub stats: &'a SessionStats,
    /// Size of the processed set.
    pub total_processed: usize,
    /// Wall time of this run.
    pub this_session: Duration,
    /// Seconds recorded by earlier runs.
    pub previous_sessions_secs: f64,
    pub initial_count: Option<u64>,
    pub final_count: Option<u64>,
}

impl Report<'_> {
    pub fn render(&self) -> String {
        let s = self.stats;
        let mut out = String::new();
        let title = if self.dry_run { "SIMULATION" } else { "COMPLETE" };
        let _ = writeln!(out, "\n{RULE}");
        let _ = writeln!(out, "🎉 BOOKMARK CLEANUP {title}!");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "⏱️  This session: {}", format_duration(self.this_session));
        if self.previous_sessions_secs > 0.0 {
            let total = self.previous_sessions_secs + self.this_session.as_secs_f64();
            let _ = writeln!(out, "⏱️  Total time: {:.1} minutes (across sessions)", total / 60.0);
        }
        if let (Some(initial), Some(now)) = (self.initial_count, self.final_count) {
            let _ = writeln!(out, "📊 Collection at start: {initial} bookmarks");
            let _ = writeln!(out, "📊 Collection now: {now} bookmarks");
            let _ = writeln!(
                out,
                "📊 Net change: {} bookmarks\n",
                initial as i64 - now as i64
            );
        }
        let _ = writeln!(out, "📊 Total processed: {}", self.total_processed);
        let _ = writeln!(out, "📋 Actions taken: {}", s.processed);
        let _ = writeln!(out, "✅ Kept: {}", s.kept);
        let _ = writeln!(out, "❌ Deleted: {}", s.deleted);
        let _ = writeln!(out, "📦 Archived: {}", s.archived);
        let _ = writeln!(out, "🔄 Moved: {}", s.moved);
        let _ = writeln!(out, "⏭️  Skipped: {}", s.skipped);
        let _ = writeln!(out, "⚠️  Errors: {}", s.errors);
        if let Some((kept, deleted)) = s.kept_deleted_percent() {
            let _ = writeln!(out, "📈 Kept: {kept:.1}% | Deleted: {deleted:.1}%");
        }
        out
    }
}

/// `H:MM:SS`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
