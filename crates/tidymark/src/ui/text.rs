//! Line-based terminal presenter and prompter.
//!
//! Reads happen on tokio's blocking pool so the pipeline can race them
//! against the interrupt signal. End of input counts as cancellation.

use super::{
    BatchReview, BreakChoice, DecisionPresenter, PlannedAction, Prompter, ResumeOffer, UiFuture,
};
use crate::error::Cancelled;
use crate::model::{Action, Approval, truncate_chars};
use std::io::{BufRead, Write};

const RULE: &str = "================================================================================";
const CHOICE_HINT: &str = "❌ Try: 'deletes', 'moves', 'archives', 'all', numbers like '1 3', 'none', or 'quit'";

/// Print `prompt` and read one line from stdin without blocking the runtime.
pub async fn read_line(prompt: impl Into<String>) -> Result<String, Cancelled> {
    let prompt = prompt.into();
    tokio::task::spawn_blocking(move || {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => Err(Cancelled),
            Ok(_) => Ok(line),
        }
    })
    .await
    .map_err(|_| Cancelled)?
}

// ── Answer parsing ─────────────────────────────────────────────────

/// What a typed review command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    /// Apply these (possibly none, which skips the batch).
    Approve(Vec<Approval>),
    Quit,
    Unknown,
}

pub fn parse_review_command(input: &str, review: &BatchReview) -> ReviewCommand {
    match input.trim().to_lowercase().as_str() {
        "quit" | "q" | "exit" => ReviewCommand::Quit,
        "none" | "skip" | "" => ReviewCommand::Approve(Vec::new()),
        "all" => ReviewCommand::Approve(review.approve_all()),
        "deletes" => ReviewCommand::Approve(review.approve_where(|a| *a == Action::Delete)),
        "moves" => {
            ReviewCommand::Approve(review.approve_where(|a| matches!(a, Action::Move { .. })))
        }
        "archives" => ReviewCommand::Approve(review.approve_where(|a| *a == Action::Archive)),
        other => parse_numbers(other, review),
    }
}

/// `1 3 5` or `1,3,5`: approve those recommendations (one-based).
fn parse_numbers(input: &str, review: &BatchReview) -> ReviewCommand {
    let mut picked = Vec::new();
    for token in input.split([',', ' ']).filter(|t| !t.is_empty()) {
        match token.parse::<usize>() {
            Ok(n) if (1..=review.len()).contains(&n) => picked.push(n - 1),
            _ => return ReviewCommand::Unknown,
        }
    }
    let approvals: Vec<Approval> = review
        .approve_all()
        .into_iter()
        .filter(|a| picked.contains(&a.index))
        .collect();
    if approvals.is_empty() {
        ReviewCommand::Unknown
    } else {
        ReviewCommand::Approve(approvals)
    }
}

/// `n`/`no` starts over; anything else resumes.
pub fn parse_resume_answer(input: &str) -> bool {
    !matches!(input.trim().to_lowercase().as_str(), "n" | "no")
}

/// Enter confirms; `cancel`, `c`, `n`, `no`, `q`, `quit` cancel.
pub fn parse_confirmation(input: &str) -> Result<(), Cancelled> {
    match input.trim().to_lowercase().as_str() {
        "cancel" | "c" | "n" | "no" | "q" | "quit" => Err(Cancelled),
        _ => Ok(()),
    }
}

pub fn parse_break_answer(input: &str) -> BreakChoice {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => BreakChoice::Pause,
        "quit" | "q" | "exit" => BreakChoice::Quit,
        _ => BreakChoice::Continue,
    }
}

// ── Rendering ──────────────────────────────────────────────────────

fn print_review(review: &BatchReview) {
    println!("\n{RULE}");
    let from = if review.collection_name.is_empty() {
        String::new()
    } else {
        format!(" FROM '{}'", review.collection_name)
    };
    let label = if review.batch_label.is_empty() {
        String::new()
    } else {
        format!(" - {}", review.batch_label)
    };
    println!(
        "🤖 RECOMMENDATIONS FOR {} BOOKMARKS{from}{label}",
        review.len()
    );
    println!("{RULE}");

    for (i, (bookmark, decision)) in review.bookmarks.iter().zip(&review.decisions).enumerate() {
        println!(
            "\n{:2}. {} {}",
            i + 1,
            decision.action.icon(),
            decision.action.label()
        );
        println!("    📰 {}", truncate_chars(&bookmark.title, 60));
        println!("    🌐 {}", bookmark.domain);
        println!("    💭 {}", decision.reasoning);
        if let Some(target) = decision.action.target() {
            println!("    📂 Target: {target}");
        }
    }

    println!("\n{RULE}");
    println!("💡 Enter your choice:");
    println!("  'deletes'  - apply all DELETE recommendations");
    println!("  'moves'    - apply all MOVE recommendations");
    println!("  'archives' - apply all ARCHIVE recommendations");
    println!("  'all'      - apply every recommendation");
    println!("  '1 3'      - apply only the listed recommendations");
    println!("  'none'     - skip this batch (keep everything)");
    println!("  'quit'     - save progress and exit");
}

/// One confirmation line, e.g. `🔄 MOVE to Gaming: Zelda guide`.
pub fn describe_planned(planned: &PlannedAction) -> String {
    let title = truncate_chars(&planned.title, 50);
    match &planned.action {
        Action::Move { target } => format!("🔄 MOVE to {target}: {title}"),
        other => format!("{} {}: {title}", other.icon(), other.label()),
    }
}

// ── TextPresenter ──────────────────────────────────────────────────

/// Prints the batch and reads a typed command.
pub struct TextPresenter;

impl DecisionPresenter for TextPresenter {
    fn present(&self, review: BatchReview) -> UiFuture<'_, Vec<Approval>> {
        Box::pin(async move {
            print_review(&review);
            loop {
                let input = read_line("\n📝 Your choice: ").await?;
                match parse_review_command(&input, &review) {
                    ReviewCommand::Approve(approvals) => return Ok(approvals),
                    ReviewCommand::Quit => return Err(Cancelled),
                    ReviewCommand::Unknown => println!("{CHOICE_HINT}"),
                }
            }
        })
    }
}

// ── ConsolePrompter ────────────────────────────────────────────────

/// Asks the non-review questions on stdin/stdout.
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn confirm_resume(&self, offer: ResumeOffer) -> UiFuture<'_, bool> {
        Box::pin(async move {
            println!(
                "\n📂 Found a saved session for '{}': page {}, {} bookmarks processed (last updated {})",
                offer.collection_name,
                offer.current_page + 1,
                offer.processed_count,
                offer.last_updated.format("%Y-%m-%d %H:%M")
            );
            if offer.recorded_dry_run != offer.dry_run {
                let mode = if offer.recorded_dry_run { "a dry run" } else { "a live run" };
                println!("⚠️  That session was {mode}; bookmarks it processed will not be offered again.");
            }
            let answer = read_line("🔄 Resume this session? (Y/n): ").await?;
            Ok(parse_resume_answer(&answer))
        })
    }

    fn confirm_actions(&self, planned: Vec<PlannedAction>) -> UiFuture<'_, ()> {
        Box::pin(async move {
            println!("\n⚠️  About to execute {} actions:", planned.len());
            for p in &planned {
                println!("    {}", describe_planned(p));
            }
            let answer =
                read_line("\nPress Enter to confirm, or type 'cancel' to cancel... ").await?;
            parse_confirmation(&answer).inspect_err(|_| println!("❌ Actions cancelled by user"))
        })
    }

    fn suggest_break(&self, processed_this_run: usize) -> UiFuture<'_, BreakChoice> {
        Box::pin(async move {
            println!("\n☕ {processed_this_run} bookmarks reviewed this run. Nice work!");
            let answer = read_line("Take a 5-minute break? (y/N/quit): ").await?;
            Ok(parse_break_answer(&answer))
        })
    }

    fn wait_for_return(&self) -> UiFuture<'_, ()> {
        Box::pin(async move {
            read_line("⏸️  Press Enter when ready to continue... ").await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bookmark, Decision};

    fn review() -> BatchReview {
        BatchReview {
            bookmarks: (1..=4).map(|i| Bookmark::new(i, format!("b{i}"))).collect(),
            decisions: vec![
                Decision::new(Action::Delete, "old"),
                Decision::keep("fine"),
                Decision::new(Action::move_to("Gaming"), "game"),
                Decision::new(Action::Archive, "history"),
            ],
            collection_name: "Inbox".into(),
            batch_label: "Batch 1".into(),
        }
    }

    fn indices(cmd: ReviewCommand) -> Vec<usize> {
        match cmd {
            ReviewCommand::Approve(a) => a.into_iter().map(|a| a.index).collect(),
            other => panic!("expected approvals, got {other:?}"),
        }
    }

    #[test]
    fn review_commands_select_by_action() {
        let r = review();
        assert_eq!(indices(parse_review_command("deletes", &r)), vec![0]);
        assert_eq!(indices(parse_review_command(" MOVES ", &r)), vec![2]);
        assert_eq!(indices(parse_review_command("archives", &r)), vec![3]);
        assert_eq!(indices(parse_review_command("all", &r)), vec![0, 2, 3]);
        assert!(indices(parse_review_command("", &r)).is_empty());
        assert!(indices(parse_review_command("skip", &r)).is_empty());
        assert_eq!(parse_review_command("exit", &r), ReviewCommand::Quit);
        assert_eq!(parse_review_command("banana", &r), ReviewCommand::Unknown);
    }

    #[test]
    fn numbered_selection_ignores_keep() {
        let r = review();
        assert_eq!(indices(parse_review_command("1, 2 4", &r)), vec![0, 3]);
        assert_eq!(parse_review_command("2", &r), ReviewCommand::Unknown);
        assert_eq!(parse_review_command("9", &r), ReviewCommand::Unknown);
    }

    #[test]
    fn yes_no_answers() {
        assert!(parse_resume_answer(""));
        assert!(parse_resume_answer("Y"));
        assert!(!parse_resume_answer("no"));
        assert!(parse_confirmation("\n").is_ok());
        assert_eq!(parse_confirmation("cancel"), Err(Cancelled));
        assert_eq!(parse_break_answer("y"), BreakChoice::Pause);
        assert_eq!(parse_break_answer("quit"), BreakChoice::Quit);
        assert_eq!(parse_break_answer(" EXIT"), BreakChoice::Quit);
        assert_eq!(parse_break_answer(""), BreakChoice::Continue);
    }

    #[test]
    fn planned_action_lines() {
        let mv = PlannedAction {
            title: "Zelda guide".into(),
            action: Action::move_to("Gaming"),
        };
        assert_eq!(describe_planned(&mv), "🔄 MOVE to Gaming: Zelda guide");
        let del = PlannedAction {
            title: "x".repeat(80),
            action: Action::Delete,
        };
        assert!(describe_planned(&del).starts_with("❌ DELETE: xxx"));
        assert!(describe_planned(&del).ends_with("..."));
    }
}
