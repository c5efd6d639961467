//! Win evaluation over a ticket and the draw history.

use serde::{Deserialize, Serialize};

use super::ticket::{Cell, Ticket, ROWS};

/// Verdict for a ticket. Ordered so that a higher verdict supersedes a lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum WinVerdict {
    #[default]
    NoWin,
    RowWin,
    FullHouse,
}

impl WinVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoWin => "no_win",
            Self::RowWin => "row",
            Self::FullHouse => "full_house",
        }
    }

    pub fn is_win(&self) -> bool {
        !matches!(self, Self::NoWin)
    }
}

/// Rows whose every filled cell is marked and called.
pub fn completed_rows(ticket: &Ticket, called: &[u8]) -> Vec<usize> {
    (0..ROWS)
        .filter(|&row| {
            let mut cells = ticket.row_cells(row).peekable();
            cells.peek().is_some() && cells.all(|c| c.marked && called.contains(&c.value))
        })
        .collect()
}

/// Evaluate a ticket against the history.
///
/// A cell only counts when it is marked and its value has been called, so marks
/// left over from before a reset never produce a win.
pub fn evaluate(ticket: &Ticket, called: &[u8]) -> WinVerdict {
    let covered = |c: &Cell| c.marked && called.contains(&c.value);
    let mut cells = ticket.cells().peekable();
    if cells.peek().is_some() && cells.all(covered) {
        WinVerdict::FullHouse
    } else if !completed_rows(ticket, called).is_empty() {
        WinVerdict::RowWin
    } else {
        WinVerdict::NoWin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ticket::{MarkOutcome, Position};
    use pretty_assertions::assert_eq;

    fn ticket() -> Ticket {
        Ticket::from_rows([
            [Some(7), None, Some(25), None, Some(41), Some(52), None, None, Some(81)],
            [None, Some(12), Some(28), Some(33), None, None, Some(64), Some(77), None],
            [Some(9), Some(18), None, Some(39), Some(45), None, None, None, Some(90)],
        ])
    }

    #[test]
    fn test_no_marks_no_win() {
        let all: Vec<u8> = (1..=90).collect();
        assert_eq!(evaluate(&ticket(), &all), WinVerdict::NoWin);
    }

    #[test]
    fn test_row_win() {
        let mut t = ticket();
        let called = t.row_values(1);
        for value in &called {
            assert_eq!(t.mark_value(*value, &called), MarkOutcome::Marked(*value));
        }
        assert_eq!(evaluate(&t, &called), WinVerdict::RowWin);
        assert_eq!(completed_rows(&t, &called), vec![1]);
    }

    #[test]
    fn test_full_house_takes_precedence() {
        let mut t = ticket();
        let called = t.values();
        for value in &called {
            t.mark_value(*value, &called);
        }
        assert_eq!(completed_rows(&t, &called), vec![0, 1, 2]);
        assert_eq!(evaluate(&t, &called), WinVerdict::FullHouse);
    }

    #[test]
    fn test_full_house_with_empty_rows() {
        let mut t = Ticket::from_rows([
            [Some(7), None, None, None, None, Some(52), None, None, None],
            [None; 9],
            [None; 9],
        ]);
        let called = vec![7, 52];
        assert_eq!(evaluate(&t, &called), WinVerdict::NoWin);

        t.mark_value(7, &called);
        assert_eq!(evaluate(&t, &called), WinVerdict::NoWin);
        t.mark_value(52, &called);
        assert_eq!(evaluate(&t, &called), WinVerdict::FullHouse);
        assert_eq!(completed_rows(&t, &called), vec![0]);
    }

    #[test]
    fn test_empty_ticket_never_wins() {
        let t = Ticket::from_rows([[None; 9]; 3]);
        assert_eq!(evaluate(&t, &[1, 2, 3]), WinVerdict::NoWin);
    }

    #[test]
    fn test_rejected_mark_does_not_change_verdict() {
        let mut t = ticket();
        let called = vec![7, 25, 41, 52];
        for value in &called {
            t.mark_value(*value, &called);
        }
        let before = evaluate(&t, &called);

        let outcome = t.toggle(Position::new(0, 8), &called);
        assert!(outcome.is_rejected());
        assert_eq!(evaluate(&t, &called), before);
        assert_eq!(before, WinVerdict::NoWin);
    }

    #[test]
    fn test_marks_without_history_do_not_win() {
        let mut t = ticket();
        let called = t.row_values(0);
        for value in &called {
            t.mark_value(*value, &called);
        }
        assert_eq!(evaluate(&t, &called), WinVerdict::RowWin);
        assert_eq!(evaluate(&t, &[]), WinVerdict::NoWin);
    }

    #[test]
    fn test_verdict_ordering() {
        assert!(WinVerdict::FullHouse > WinVerdict::RowWin);
        assert!(WinVerdict::RowWin > WinVerdict::NoWin);
        assert!(!WinVerdict::NoWin.is_win());
    }
}
