//! Game state management.
//!
//! `GameState` is the shared picture of a session: the called history, the
//! number on screen, its announcement text and the status. The host owns the
//! only authoritative copy inside a [`GameMachine`]; participants hold a mirror
//! that is replaced or extended by protocol messages.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::status::{GameEvent, GameStatus, InvalidTransition, StatusMachine};

/// Highest number in the pool.
pub const MAX_NUMBER: u8 = 90;

/// Announcement shown once the pool runs dry.
pub const TERMINAL_ANNOUNCEMENT: &str = "All 90 numbers have been called. Game over!";

/// A local action the host refused. Never fatal, never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("all numbers have been drawn")]
    Exhausted,

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Check that a history could have come from a single session.
pub fn is_valid_history(history: &[u8]) -> bool {
    let mut seen = [false; MAX_NUMBER as usize + 1];
    history.len() <= MAX_NUMBER as usize
        && history.iter().all(|&n| {
            (1..=MAX_NUMBER).contains(&n) && !std::mem::replace(&mut seen[n as usize], true)
        })
}

/// Shared session state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Drawn numbers in draw order
    pub called_numbers: Vec<u8>,

    /// Number currently on display
    pub current_number: Option<u8>,

    /// Text for the current number (or the last one that arrived)
    pub current_announcement: String,

    pub status: GameStatus,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_called(&self, number: u8) -> bool {
        self.called_numbers.contains(&number)
    }

    pub fn called_count(&self) -> usize {
        self.called_numbers.len()
    }

    pub fn remaining(&self) -> usize {
        MAX_NUMBER as usize - self.called_numbers.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.called_numbers.len() == MAX_NUMBER as usize
    }

    /// Status as far as a mirror can tell from the history alone.
    ///
    /// Participants never see the host's timer, so an in-progress game mirrors
    /// as `Stopped`.
    pub fn mirrored_status(history_len: usize) -> GameStatus {
        match history_len {
            0 => GameStatus::Idle,
            n if n >= MAX_NUMBER as usize => GameStatus::Exhausted,
            _ => GameStatus::Stopped,
        }
    }

    /// Replace the whole state from a snapshot.
    pub fn replace(
        &mut self,
        history: Vec<u8>,
        current_number: Option<u8>,
        current_announcement: String,
    ) {
        self.status = Self::mirrored_status(history.len());
        self.called_numbers = history;
        self.current_number = current_number;
        self.current_announcement = current_announcement;
    }

    /// Clear back to a fresh session.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Numbers not drawn yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawPool {
    remaining: Vec<u8>,
}

impl Default for DrawPool {
    fn default() -> Self {
        Self::full()
    }
}

impl DrawPool {
    /// A pool holding 1..=90.
    pub fn full() -> Self {
        Self {
            remaining: (1..=MAX_NUMBER).collect(),
        }
    }

    /// Remove a uniformly chosen number.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<u8> {
        if self.remaining.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.remaining.len());
        Some(self.remaining.swap_remove(index))
    }

    pub fn contains(&self, number: u8) -> bool {
        self.remaining.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Repeating automatic-draw schedule.
///
/// Holds no timer of its own; the event loop asks for [`AutoDraw::next_due`]
/// and sleeps until then. Stopping clears the deadline, so nothing can fire
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct AutoDraw {
    interval: Duration,
    next_due: Option<Instant>,
}

impl AutoDraw {
    /// Begin firing every `interval`. Returns false if already active.
    pub fn start(&mut self, interval: Duration, now: Instant) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        self.interval = interval;
        self.next_due = Some(now + interval);
        true
    }

    /// Cancel the schedule. Returns false if it was not active.
    pub fn stop(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Schedule the next firing after one has been consumed.
    pub fn reschedule(&mut self, now: Instant) {
        if self.next_due.is_some() {
            self.next_due = Some(now + self.interval);
        }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Result of a successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub number: u8,
    /// This draw emptied the pool and moved the game to `Exhausted`.
    pub exhausted: bool,
}

/// Host-side authoritative game.
#[derive(Debug, Clone)]
pub struct GameMachine {
    state: GameState,
    pool: DrawPool,
    auto: AutoDraw,
    rng: StdRng,
}

impl Default for GameMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMachine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic draw order.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: GameState::new(),
            pool: DrawPool::full(),
            auto: AutoDraw::default(),
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn pool(&self) -> &DrawPool {
        &self.pool
    }

    fn transition(&mut self, event: GameEvent) -> Result<(), InvalidTransition> {
        let mut machine = StatusMachine::at(self.state.status);
        machine.apply_mut(event)?;
        self.state.status = machine.status();
        Ok(())
    }

    /// Apply an event accepted from every status (`StopAutomatic`, `Reset`).
    fn settle(&mut self, event: GameEvent) {
        if let Err(err) = self.transition(event) {
            debug!(error = %err, "transition refused");
        }
    }

    /// Draw one number.
    ///
    /// The draw that empties the pool also exhausts the game: the automatic
    /// cycle is cancelled, the current number cleared and the terminal
    /// announcement set.
    pub fn draw(&mut self) -> Result<DrawOutcome, Rejected> {
        if !self.state.status.can_draw() {
            return Err(Rejected::Exhausted);
        }
        if self.pool.is_empty() {
            self.exhaust();
            return Err(Rejected::Exhausted);
        }

        self.transition(GameEvent::Draw)?;
        let Some(number) = self.pool.draw(&mut self.rng) else {
            return Err(Rejected::Exhausted);
        };
        self.state.called_numbers.push(number);
        self.state.current_number = Some(number);

        let exhausted = self.pool.is_empty();
        if exhausted {
            self.exhaust();
        }

        Ok(DrawOutcome { number, exhausted })
    }

    fn exhaust(&mut self) {
        self.auto.stop();
        if self.transition(GameEvent::Exhaust).is_ok() {
            self.state.current_number = None;
            self.state.current_announcement = TERMINAL_ANNOUNCEMENT.to_string();
        }
    }

    /// Begin automatic draws. Returns `Ok(false)` when already running.
    pub fn start_automatic(&mut self, interval: Duration, now: Instant) -> Result<bool, Rejected> {
        if self.state.status.is_running() {
            return Ok(false);
        }
        if !self.state.status.can_draw() {
            return Err(Rejected::Exhausted);
        }
        self.transition(GameEvent::StartAutomatic)?;
        self.auto.start(interval, now);
        Ok(true)
    }

    /// Cancel automatic draws. Returns false when nothing was running.
    pub fn stop_automatic(&mut self) -> bool {
        let was_running = self.auto.stop();
        self.settle(GameEvent::StopAutomatic);
        was_running
    }

    /// Clear all draw state. The automatic cycle is cancelled first.
    pub fn reset(&mut self) {
        self.auto.stop();
        self.settle(GameEvent::Reset);
        self.state.clear();
        self.pool = DrawPool::full();
    }

    /// Check if an automatic draw should fire.
    pub fn is_due(&self, now: Instant) -> bool {
        self.state.status.is_running() && self.auto.is_due(now)
    }

    pub fn reschedule(&mut self, now: Instant) {
        self.auto.reschedule(now);
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.auto.next_due()
    }

    /// Apply announcement text for a drawn number.
    ///
    /// Text only lands while `number` is still on display; replies for an older
    /// draw, or ones arriving after a reset or exhaustion, are dropped.
    pub fn apply_announcement(&mut self, number: u8, text: String) -> bool {
        if self.state.current_number != Some(number) {
            debug!(number, "dropping stale announcement");
            return false;
        }
        self.state.current_announcement = text;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_game_new() {
        let game = GameMachine::seeded(1);
        assert_eq!(game.status(), GameStatus::Idle);
        assert!(game.state().called_numbers.is_empty());
        assert_eq!(game.state().current_number, None);
        assert_eq!(game.pool().len(), 90);
    }

    #[test]
    fn test_draw_until_exhausted() {
        let mut game = GameMachine::seeded(42);

        for expected in 1..=90usize {
            let outcome = game.draw().unwrap();
            let state = game.state();
            assert_eq!(state.called_count(), expected);
            assert!(is_valid_history(&state.called_numbers));
            assert_eq!(outcome.exhausted, expected == 90);
            assert_eq!(state.status == GameStatus::Exhausted, state.called_count() == 90);
        }

        let state = game.state();
        assert_eq!(state.current_number, None);
        assert_eq!(state.current_announcement, TERMINAL_ANNOUNCEMENT);

        let mut sorted = state.called_numbers.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=90).collect::<Vec<u8>>());

        assert_eq!(game.draw(), Err(Rejected::Exhausted));
        assert_eq!(game.state().called_count(), 90);
    }

    #[test]
    fn test_manual_draw_pauses() {
        let mut game = GameMachine::seeded(3);
        let outcome = game.draw().unwrap();
        assert_eq!(game.status(), GameStatus::Stopped);
        assert_eq!(game.state().current_number, Some(outcome.number));
        assert!(!game.pool().contains(outcome.number));
    }

    #[test]
    fn test_start_automatic_is_idempotent() {
        let mut game = GameMachine::seeded(5);
        let now = Instant::now();
        let interval = Duration::from_secs(4);

        assert_eq!(game.start_automatic(interval, now), Ok(true));
        let due = game.next_due();

        let later = now + Duration::from_secs(1);
        assert_eq!(game.start_automatic(interval, later), Ok(false));
        assert_eq!(game.next_due(), due);
        assert_eq!(game.status(), GameStatus::Running);
    }

    #[test]
    fn test_stop_cancels_schedule() {
        let mut game = GameMachine::seeded(5);
        let now = Instant::now();
        game.start_automatic(Duration::from_millis(10), now).unwrap();

        assert!(game.stop_automatic());
        assert!(!game.stop_automatic());
        assert_eq!(game.status(), GameStatus::Stopped);
        assert_eq!(game.next_due(), None);
        assert!(!game.is_due(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_due_and_reschedule() {
        let mut game = GameMachine::seeded(9);
        let now = Instant::now();
        let interval = Duration::from_millis(500);
        game.start_automatic(interval, now).unwrap();

        assert!(!game.is_due(now));
        let fire = now + interval;
        assert!(game.is_due(fire));

        game.reschedule(fire);
        assert_eq!(game.next_due(), Some(fire + interval));
    }

    #[test]
    fn test_reset_stops_and_clears() {
        let mut game = GameMachine::seeded(11);
        let now = Instant::now();
        game.start_automatic(Duration::from_millis(10), now).unwrap();
        game.draw().unwrap();
        game.draw().unwrap();

        game.reset();

        assert_eq!(game.status(), GameStatus::Idle);
        assert_eq!(game.state(), &GameState::default());
        assert_eq!(game.next_due(), None);
        assert!(!game.is_due(now + Duration::from_secs(60)));
        assert_eq!(game.pool().len(), 90);
    }

    #[test]
    fn test_exhausted_cannot_start() {
        let mut game = GameMachine::seeded(13);
        for _ in 0..90 {
            game.draw().unwrap();
        }
        assert_eq!(
            game.start_automatic(Duration::from_secs(1), Instant::now()),
            Err(Rejected::Exhausted)
        );
        assert!(!game.stop_automatic());
        assert_eq!(game.status(), GameStatus::Exhausted);
    }

    #[test]
    fn test_stop_and_reset_accepted_from_every_status() {
        let mut game = GameMachine::seeded(23);
        assert!(!game.stop_automatic());
        assert_eq!(game.status(), GameStatus::Idle);
        game.reset();
        assert_eq!(game.status(), GameStatus::Idle);

        game.draw().unwrap();
        assert!(!game.stop_automatic());
        assert_eq!(game.status(), GameStatus::Stopped);

        for _ in 1..90 {
            game.draw().unwrap();
        }
        assert!(!game.stop_automatic());
        assert_eq!(game.status(), GameStatus::Exhausted);
        game.reset();
        assert_eq!(game.status(), GameStatus::Idle);
        assert_eq!(game.pool().len(), 90);
    }

    #[test]
    fn test_exhaustion_cancels_automatic() {
        let mut game = GameMachine::seeded(17);
        let now = Instant::now();
        game.start_automatic(Duration::from_millis(1), now).unwrap();
        for _ in 0..90 {
            game.draw().unwrap();
        }
        assert_eq!(game.next_due(), None);
        assert!(!game.is_due(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_stale_announcement_dropped() {
        let mut game = GameMachine::seeded(19);
        let first = game.draw().unwrap().number;
        let second = game.draw().unwrap().number;

        assert!(!game.apply_announcement(first, "old".to_string()));
        assert!(game.apply_announcement(second, "fresh".to_string()));
        assert_eq!(game.state().current_announcement, "fresh");

        game.reset();
        assert!(!game.apply_announcement(second, "late".to_string()));
        assert_eq!(game.state().current_announcement, "");
    }

    #[test]
    fn test_history_validation() {
        assert!(is_valid_history(&[]));
        assert!(is_valid_history(&[7, 52, 81]));
        assert!(!is_valid_history(&[7, 7]));
        assert!(!is_valid_history(&[0]));
        assert!(!is_valid_history(&[91]));
    }

    #[test]
    fn test_mirrored_status() {
        assert_eq!(GameState::mirrored_status(0), GameStatus::Idle);
        assert_eq!(GameState::mirrored_status(3), GameStatus::Stopped);
        assert_eq!(GameState::mirrored_status(90), GameStatus::Exhausted);
    }

    #[test]
    fn test_state_json_shape() {
        let mut state = GameState::new();
        state.replace(vec![7, 52], Some(52), "Fifty-two".to_string());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "calledNumbers": [7, 52],
                "currentNumber": 52,
                "currentAnnouncement": "Fifty-two",
                "status": "Stopped"
            })
        );
    }
}
