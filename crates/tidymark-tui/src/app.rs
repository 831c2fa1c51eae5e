//! Review-screen state.

use tidymark::interrupt::Interrupt;
use tidymark::model::{Action, Approval};
use tidymark::ui::BatchReview;

/// One bookmark row: the actions it can cycle through and the current pick.
pub(crate) struct Row {
    pub(crate) choices: Vec<Action>,
    pub(crate) selected: usize,
}

impl Row {
    /// KEEP and DELETE always; the recommendation too when it is a MOVE or
    /// ARCHIVE. Starts on the recommendation.
    fn for_recommendation(recommended: &Action) -> Self {
        let mut choices = vec![Action::Keep, Action::Delete];
        if !choices.contains(recommended) {
            choices.push(recommended.clone());
        }
        let selected = choices.iter().position(|a| a == recommended).unwrap_or(0);
        Self { choices, selected }
    }

    pub(crate) fn action(&self) -> &Action {
        &self.choices[self.selected]
    }

    fn cycle(&mut self, forward: bool) {
        let n = self.choices.len();
        self.selected = if forward {
            (self.selected + 1) % n
        } else {
            (self.selected + n - 1) % n
        };
    }
}

/// How the review screen was left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Exit {
    Submit,
    Cancel,
}

pub(crate) struct App {
    pub(crate) rows: Vec<Row>,
    pub(crate) cursor: usize,
    /// Top visible row.
    pub(crate) scroll: usize,
    pub(crate) exit: Option<Exit>,
}

impl App {
    pub(crate) fn new(review: &BatchReview) -> Self {
        Self {
            rows: review
                .decisions
                .iter()
                .map(|d| Row::for_recommendation(&d.action))
                .collect(),
            cursor: 0,
            scroll: 0,
            exit: None,
        }
    }

    pub(crate) fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn cursor_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub(crate) fn cycle_action(&mut self, forward: bool) {
        if let Some(row) = self.rows.get_mut(self.cursor) {
            row.cycle(forward);
        }
    }

    /// Leave as cancelled once the run has been interrupted from outside.
    pub(crate) fn observe_interrupt(&mut self, interrupt: &Interrupt) {
        if self.exit.is_none() && interrupt.is_triggered() {
            self.exit = Some(Exit::Cancel);
        }
    }

    /// Every row whose pick is not KEEP.
    pub(crate) fn approvals(&self) -> Vec<Approval> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.action().is_keep())
            .map(|(i, row)| Approval::new(i, row.action().clone()))
            .collect()
    }

    /// Picks per action label, in display order.
    pub(crate) fn tally(&self) -> [(&'static str, usize); 4] {
        let mut tally = [("KEEP", 0), ("DELETE", 0), ("ARCHIVE", 0), ("MOVE", 0)];
        for row in &self.rows {
            let label = row.action().label();
            if let Some(entry) = tally.iter_mut().find(|(l, _)| *l == label) {
                entry.1 += 1;
            }
        }
        tally
    }
}
