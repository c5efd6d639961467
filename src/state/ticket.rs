//! Ticket model.
//!
//! A ticket is a 3x9 grid. Every row holds exactly five numbers, column `i`
//! only draws from its own band (`1..=9`, `10..=19`, ..., `80..=90`), values in
//! a column ascend top to bottom, and no value repeats anywhere on the ticket.

use std::ops::RangeInclusive;

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rows per ticket.
pub const ROWS: usize = 3;

/// Columns per ticket.
pub const COLUMNS: usize = 9;

/// Filled cells per row.
pub const NUMBERS_PER_ROW: usize = 5;

/// Numeric band a column draws from. The last band is one wider (`80..=90`).
pub fn column_band(col: usize) -> RangeInclusive<u8> {
    match col {
        0 => 1..=9,
        1..=7 => {
            let low = col as u8 * 10;
            low..=low + 9
        }
        _ => 80..=90,
    }
}

/// Column a value belongs to, if it is a valid draw.
pub fn column_for(value: u8) -> Option<usize> {
    match value {
        1..=9 => Some(0),
        10..=79 => Some(value as usize / 10),
        80..=90 => Some(8),
        _ => None,
    }
}

/// Grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check if position is within the grid.
    pub fn is_valid(&self) -> bool {
        self.row < ROWS && self.col < COLUMNS
    }
}

/// A filled ticket cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: u8,
    pub marked: bool,
}

impl Cell {
    pub fn new(value: u8) -> Self {
        Self {
            value,
            marked: false,
        }
    }
}

/// Why a mark request was turned down. The ticket is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkRejection {
    OutOfBounds,
    EmptyCell,
    /// The value has not been called yet.
    NotCalled(u8),
    NotOnTicket(u8),
}

/// Result of a mark request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked(u8),
    Unmarked(u8),
    Rejected(MarkRejection),
}

impl MarkOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Structural problems found by [`Ticket::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("row {row} has {count} numbers, expected {NUMBERS_PER_ROW}")]
    RowCount { row: usize, count: usize },

    #[error("value {value} at ({row}, {col}) is outside the column band")]
    OutOfBand { row: usize, col: usize, value: u8 },

    #[error("column {col} is not ascending top to bottom")]
    ColumnOrder { col: usize },

    #[error("value {value} appears more than once")]
    Duplicate { value: u8 },
}

/// A participant's number grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    cells: [[Option<Cell>; COLUMNS]; ROWS],
}

impl Ticket {
    /// Generate a ticket with the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate a ticket from the given RNG.
    ///
    /// Each row independently picks five of the nine columns and fills each with
    /// a value from that column's band, resampling when the column already holds
    /// the value. A second pass sorts every column's values into ascending row
    /// order while leaving the filled positions where they are.
    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        let mut cells = [[None; COLUMNS]; ROWS];

        for row in 0..ROWS {
            for col in index::sample(rng, COLUMNS, NUMBERS_PER_ROW).into_iter() {
                let band = column_band(col);
                let value = loop {
                    let candidate = rng.gen_range(band.clone());
                    let taken = cells[..row]
                        .iter()
                        .any(|r: &[Option<Cell>; COLUMNS]| {
                            r[col].map(|c| c.value) == Some(candidate)
                        });
                    if !taken {
                        break candidate;
                    }
                };
                cells[row][col] = Some(Cell::new(value));
            }
        }

        for col in 0..COLUMNS {
            let mut values: Vec<u8> = cells
                .iter()
                .filter_map(|r| r[col].map(|c| c.value))
                .collect();
            values.sort_unstable();

            let mut sorted = values.into_iter();
            for row in cells.iter_mut() {
                if let Some(cell) = row[col].as_mut() {
                    if let Some(value) = sorted.next() {
                        cell.value = value;
                    }
                }
            }
        }

        Self { cells }
    }

    /// Build a ticket from explicit rows. Used for restoring and for tests.
    pub fn from_rows(rows: [[Option<u8>; COLUMNS]; ROWS]) -> Self {
        let mut cells = [[None; COLUMNS]; ROWS];
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                cells[row][col] = value.map(Cell::new);
            }
        }
        Self { cells }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), TicketError> {
        let mut seen = [false; 91];

        for (row, cells) in self.cells.iter().enumerate() {
            let count = cells.iter().filter(|c| c.is_some()).count();
            if count != NUMBERS_PER_ROW {
                return Err(TicketError::RowCount { row, count });
            }

            for (col, cell) in cells.iter().enumerate() {
                let Some(cell) = cell else { continue };
                if !column_band(col).contains(&cell.value) {
                    return Err(TicketError::OutOfBand {
                        row,
                        col,
                        value: cell.value,
                    });
                }
                let slot = &mut seen[cell.value as usize];
                if *slot {
                    return Err(TicketError::Duplicate { value: cell.value });
                }
                *slot = true;
            }
        }

        for col in 0..COLUMNS {
            let values: Vec<u8> = self.column_values(col).collect();
            if values.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(TicketError::ColumnOrder { col });
            }
        }

        Ok(())
    }

    /// Get cell at position.
    pub fn get(&self, pos: Position) -> Option<&Cell> {
        if pos.is_valid() {
            self.cells[pos.row][pos.col].as_ref()
        } else {
            None
        }
    }

    /// Find where a value sits on this ticket.
    pub fn position_of(&self, value: u8) -> Option<Position> {
        let col = column_for(value)?;
        (0..ROWS)
            .find(|&row| self.cells[row][col].map(|c| c.value) == Some(value))
            .map(|row| Position::new(row, col))
    }

    /// Toggle the mark on a cell.
    ///
    /// Unmarking always succeeds. Marking requires the cell's value to be in
    /// `called`.
    pub fn toggle(&mut self, pos: Position, called: &[u8]) -> MarkOutcome {
        if !pos.is_valid() {
            return MarkOutcome::Rejected(MarkRejection::OutOfBounds);
        }
        let Some(cell) = self.cells[pos.row][pos.col].as_mut() else {
            return MarkOutcome::Rejected(MarkRejection::EmptyCell);
        };

        if cell.marked {
            cell.marked = false;
            MarkOutcome::Unmarked(cell.value)
        } else if called.contains(&cell.value) {
            cell.marked = true;
            MarkOutcome::Marked(cell.value)
        } else {
            MarkOutcome::Rejected(MarkRejection::NotCalled(cell.value))
        }
    }

    /// Mark a value wherever it sits. Marking an already-marked cell is a no-op.
    pub fn mark_value(&mut self, value: u8, called: &[u8]) -> MarkOutcome {
        let Some(pos) = self.position_of(value) else {
            return MarkOutcome::Rejected(MarkRejection::NotOnTicket(value));
        };
        if self.get(pos).is_some_and(|c| c.marked) {
            return MarkOutcome::Marked(value);
        }
        self.toggle(pos, called)
    }

    /// Clear every mark.
    pub fn clear_marks(&mut self) {
        for cell in self.cells.iter_mut().flatten().flatten() {
            cell.marked = false;
        }
    }

    /// Filled cells of a row, left to right.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = &Cell> {
        self.cells
            .get(row)
            .into_iter()
            .flat_map(|r| r.iter().flatten())
    }

    /// Values of a row, left to right.
    pub fn row_values(&self, row: usize) -> Vec<u8> {
        self.row_cells(row).map(|c| c.value).collect()
    }

    /// Values of a column, top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = u8> + '_ {
        self.cells
            .iter()
            .filter_map(move |r| r.get(col).copied().flatten().map(|c| c.value))
    }

    /// All filled cells.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten().flatten()
    }

    /// All values on the ticket.
    pub fn values(&self) -> Vec<u8> {
        self.cells().map(|c| c.value).collect()
    }

    /// Count marked cells.
    pub fn marked_count(&self) -> usize {
        self.cells().filter(|c| c.marked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_ticket() -> Ticket {
        Ticket::from_rows([
            [Some(7), None, Some(25), None, Some(41), Some(52), None, None, Some(81)],
            [None, Some(12), Some(28), Some(33), None, None, Some(64), Some(77), None],
            [Some(9), Some(18), None, Some(39), Some(45), None, None, None, Some(90)],
        ])
    }

    #[test]
    fn test_column_bands() {
        assert_eq!(column_band(0), 1..=9);
        assert_eq!(column_band(1), 10..=19);
        assert_eq!(column_band(7), 70..=79);
        assert_eq!(column_band(8), 80..=90);
        assert_eq!(column_for(9), Some(0));
        assert_eq!(column_for(10), Some(1));
        assert_eq!(column_for(90), Some(8));
        assert_eq!(column_for(0), None);
        assert_eq!(column_for(91), None);
    }

    #[test]
    fn test_generated_tickets_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let ticket = Ticket::generate_with(&mut rng);
            assert_eq!(ticket.validate(), Ok(()));
            for row in 0..ROWS {
                assert_eq!(ticket.row_values(row).len(), NUMBERS_PER_ROW);
            }
            assert_eq!(ticket.values().len(), ROWS * NUMBERS_PER_ROW);
            assert_eq!(ticket.marked_count(), 0);
        }
    }

    #[test]
    fn test_generate_thread_rng() {
        assert!(Ticket::generate().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tickets() {
        let short_row = Ticket::from_rows([
            [Some(7), None, None, None, None, None, None, None, None],
            [None; COLUMNS],
            [None; COLUMNS],
        ]);
        assert_eq!(
            short_row.validate(),
            Err(TicketError::RowCount { row: 0, count: 1 })
        );

        let mut rows = [
            [Some(7), None, Some(25), None, Some(41), Some(52), None, None, Some(81)],
            [None, Some(12), Some(28), Some(33), None, None, Some(64), Some(77), None],
            [Some(9), Some(18), None, Some(39), Some(45), None, None, None, Some(90)],
        ];
        rows[0][1] = Some(5);
        rows[0][0] = None;
        assert!(matches!(
            Ticket::from_rows(rows).validate(),
            Err(TicketError::OutOfBand { row: 0, col: 1, value: 5 })
        ));

        let descending = Ticket::from_rows([
            [Some(8), None, Some(25), None, Some(41), Some(52), None, None, Some(81)],
            [None, Some(12), Some(28), Some(33), None, None, Some(64), Some(77), None],
            [Some(3), Some(18), None, Some(39), Some(45), None, None, None, Some(90)],
        ]);
        assert_eq!(descending.validate(), Err(TicketError::ColumnOrder { col: 0 }));

        assert_eq!(sample_ticket().validate(), Ok(()));
    }

    #[test]
    fn test_toggle_requires_called_value() {
        let mut ticket = sample_ticket();
        let before = ticket.clone();

        let outcome = ticket.toggle(Position::new(0, 0), &[52]);
        assert_eq!(outcome, MarkOutcome::Rejected(MarkRejection::NotCalled(7)));
        assert_eq!(ticket, before);

        assert_eq!(ticket.toggle(Position::new(0, 0), &[7]), MarkOutcome::Marked(7));
        assert_eq!(ticket.marked_count(), 1);

        // Unmarking is always allowed
        assert_eq!(ticket.toggle(Position::new(0, 0), &[]), MarkOutcome::Unmarked(7));
        assert_eq!(ticket.marked_count(), 0);
    }

    #[test]
    fn test_toggle_rejections() {
        let mut ticket = sample_ticket();
        assert_eq!(
            ticket.toggle(Position::new(0, 1), &[12]),
            MarkOutcome::Rejected(MarkRejection::EmptyCell)
        );
        assert_eq!(
            ticket.toggle(Position::new(3, 0), &[7]),
            MarkOutcome::Rejected(MarkRejection::OutOfBounds)
        );
        assert_eq!(
            ticket.mark_value(50, &[50]),
            MarkOutcome::Rejected(MarkRejection::NotOnTicket(50))
        );
    }

    #[test]
    fn test_mark_value_and_clear() {
        let mut ticket = sample_ticket();
        assert_eq!(ticket.position_of(64), Some(Position::new(1, 6)));
        assert_eq!(ticket.mark_value(64, &[64]), MarkOutcome::Marked(64));
        assert_eq!(ticket.mark_value(64, &[64]), MarkOutcome::Marked(64));
        assert_eq!(ticket.marked_count(), 1);

        ticket.clear_marks();
        assert_eq!(ticket.marked_count(), 0);
    }

    #[test]
    fn test_ticket_serializes() {
        let ticket = sample_ticket();
        let json = serde_json::to_string(&ticket).unwrap();
        let back: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ticket);
    }
}
