//! Parse free-text model answers into one [`Decision`] per bookmark.
//!
//! The model is asked to answer with numbered lines:
//!
//! ```text
//! 1. DELETE - outdated tutorial
//! 2. MOVE:Development - coding tool
//! 3. KEEP
//!    Reasoning: active reference
//! ```
//!
//! Reasoning either follows ` - ` on the same line or comes from the lines
//! below it, up to the next numbered line or a `Summary:` section. Anything
//! that is not a recognised action becomes KEEP.

use crate::model::{Action, Decision};
use tracing::debug;

const NO_REASON: &str = "no reason given";
const NO_RECOMMENDATION: &str = "no recommendation received";
const REASON_PREFIXES: [&str; 3] = ["reasoning:", "reason:", "-"];

/// Parse `text` into exactly `expected` decisions, padding with KEEP.
pub fn parse_decisions(text: &str, expected: usize) -> Vec<Decision> {
    debug!("Parsing model answer for {expected} bookmark(s): {text:?}");

    let lines: Vec<&str> = text.trim().lines().map(str::trim).collect();
    let mut decisions = Vec::with_capacity(expected);

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        debug!("line {i}: {line:?}");

        if let Some(body) = decision_body(line) {
            let (action_part, reasoning) = match body.split_once(" - ") {
                Some((action, reason)) => (action.trim(), reason.trim().to_string()),
                None => {
                    let mut reasons = Vec::new();
                    let mut j = i + 1;
                    while j < lines.len() && !ends_reasoning(lines[j]) {
                        let cleaned = strip_reason_prefix(lines[j]);
                        if !cleaned.is_empty() {
                            reasons.push(cleaned);
                        }
                        j += 1;
                    }
                    i = j - 1;
                    (body.trim(), reasons.join(" "))
                }
            };
            let reasoning = if reasoning.is_empty() {
                NO_REASON.to_string()
            } else {
                reasoning
            };

            let decision = to_decision(action_part, reasoning);
            debug!("  -> {} ({})", decision.action, decision.reasoning);
            decisions.push(decision);
        }
        i += 1;
    }

    if decisions.len() != expected {
        debug!(
            "Model answered {} decision(s) for {expected} bookmark(s)",
            decisions.len()
        );
    }
    decisions.resize_with(expected, || Decision::keep(NO_RECOMMENDATION));
    decisions
}

/// The text after `N. ` on a numbered line.
fn decision_body(line: &str) -> Option<&str> {
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    line.split_once(". ").map(|(_, body)| body.trim())
}

fn ends_reasoning(line: &str) -> bool {
    let lower = line.to_lowercase();
    decision_body(line).is_some()
        || lower.starts_with("summary:")
        || lower.starts_with("reasoning summary:")
}

fn strip_reason_prefix(line: &str) -> &str {
    let lower = line.to_lowercase();
    for prefix in REASON_PREFIXES {
        if lower.starts_with(prefix) {
            // Prefixes are ASCII, so the byte offset is valid in `line`.
            return line.get(prefix.len()..).unwrap_or_default().trim();
        }
    }
    line
}

fn to_decision(action_part: &str, reasoning: String) -> Decision {
    let tag = action_part.trim_matches(|c: char| c == '*' || c == '`').trim();
    let upper = tag.to_uppercase();

    if upper.starts_with("MOVE:") {
        let target = tag
            .split_once(':')
            .map(|(_, name)| name.trim().trim_start_matches('[').trim_end_matches(']').trim())
            .unwrap_or_default();
        if target.is_empty() {
            return Decision::keep("parse error");
        }
        return Decision::new(Action::move_to(target), reasoning);
    }

    match upper.as_str() {
        "DELETE" => Decision::new(Action::Delete, reasoning),
        "KEEP" => Decision::new(Action::Keep, reasoning),
        "ARCHIVE" => Decision::new(Action::Archive, reasoning),
        _ => {
            debug!("Unknown action {upper:?}, defaulting to KEEP");
            Decision::keep(format!("unclear recommendation: {upper}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_reasoning() {
        let text = "1. DELETE - outdated tutorial\n2. MOVE:Development - coding tool\n3. KEEP - active reference\n4. ARCHIVE - historical doc";
        let decisions = parse_decisions(text, 4);
        assert_eq!(decisions[0], Decision::new(Action::Delete, "outdated tutorial"));
        assert_eq!(
            decisions[1],
            Decision::new(Action::move_to("Development"), "coding tool")
        );
        assert_eq!(decisions[2].action, Action::Keep);
        assert_eq!(decisions[3].action, Action::Archive);
    }

    #[test]
    fn reasoning_on_following_lines() {
        let text = "Here you go:\n\n1. DELETE\n   Reasoning: old news\n   - nobody reads it\n2. keep\n\nSummary: mostly junk";
        let decisions = parse_decisions(text, 2);
        assert_eq!(decisions[0].action, Action::Delete);
        assert_eq!(decisions[0].reasoning, "old news nobody reads it");
        assert_eq!(decisions[1].action, Action::Keep);
        assert_eq!(decisions[1].reasoning, NO_REASON);
    }

    #[test]
    fn unknown_and_malformed_tags_become_keep() {
        let text = "1. MAYBE - not sure\n2. MOVE: - nowhere\n3. **DELETE** - spam\n4. MOVE:[Gaming] - game guide";
        let decisions = parse_decisions(text, 4);
        assert_eq!(
            decisions[0],
            Decision::keep("unclear recommendation: MAYBE")
        );
        assert_eq!(decisions[1], Decision::keep("parse error"));
        assert_eq!(decisions[2].action, Action::Delete);
        assert_eq!(decisions[3].action, Action::move_to("Gaming"));
    }

    #[test]
    fn pads_and_truncates_to_batch_length() {
        let short = parse_decisions("1. DELETE - x", 3);
        assert_eq!(short.len(), 3);
        assert_eq!(short[2], Decision::keep(NO_RECOMMENDATION));

        let long = parse_decisions("1. DELETE - a\n2. DELETE - b\n3. DELETE - c", 2);
        assert_eq!(long.len(), 2);

        assert_eq!(parse_decisions("", 2).len(), 2);
    }
}
