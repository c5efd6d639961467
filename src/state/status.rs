//! Game status state machine.
//!
//! Tracks whether the host is drawing automatically, paused, or finished, and
//! validates transitions.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────┐  draw   ┌─────────┐  start   ┌─────────┐
//! │ Idle │────────▶│ Stopped │─────────▶│ Running │
//! └──┬───┘         │         │◀─────────│         │
//!    │             └────┬────┘   stop   └──▲──┬───┘
//!    │ start            │                  │  │
//!    └──────────────────┼──────────────────┘  │
//!                       │ last number drawn   │
//!                       ▼                     ▼
//!                 ┌───────────────────────────────┐
//!                 │           Exhausted           │
//!                 └───────────────────────────────┘
//!
//! reset: any state ──▶ Idle
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Nothing drawn yet, or freshly reset
    #[default]
    Idle,
    /// Automatic draws firing on a timer
    Running,
    /// Paused; draws only on demand
    Stopped,
    /// All numbers drawn
    Exhausted,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Exhausted => "exhausted",
        }
    }

    /// Check if a draw can still happen.
    pub fn can_draw(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }

    /// Check if the automatic cycle is active.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Draw,
    StartAutomatic,
    StopAutomatic,
    Exhaust,
    Reset,
}

/// Error when a status transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition from {from} via {event:?}: {reason}")]
pub struct InvalidTransition {
    pub from: GameStatus,
    pub event: GameEvent,
    pub reason: &'static str,
}

/// Status state machine.
#[derive(Debug, Clone, Default)]
pub struct StatusMachine {
    status: GameStatus,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a machine at a specific status (for restoring state).
    pub fn at(status: GameStatus) -> Self {
        Self { status }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Apply an event, returning the new machine or an error.
    pub fn apply(&self, event: GameEvent) -> Result<Self, InvalidTransition> {
        Ok(Self {
            status: self.transition(event)?,
        })
    }

    /// Apply an event in place.
    pub fn apply_mut(&mut self, event: GameEvent) -> Result<(), InvalidTransition> {
        self.status = self.transition(event)?;
        Ok(())
    }

    fn transition(&self, event: GameEvent) -> Result<GameStatus, InvalidTransition> {
        use GameEvent::*;
        use GameStatus::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: self.status,
            event,
            reason,
        };

        match (self.status, event) {
            // Reset: Any -> Idle
            (_, Reset) => Ok(Idle),

            // Draw: a manual draw from Idle leaves the session paused
            (Idle, Draw) => Ok(Stopped),
            (Running, Draw) => Ok(Running),
            (Stopped, Draw) => Ok(Stopped),
            (Exhausted, Draw) => Err(invalid("All numbers have been drawn")),

            // StartAutomatic is idempotent while running
            (Idle | Stopped | Running, StartAutomatic) => Ok(Running),
            (Exhausted, StartAutomatic) => Err(invalid("All numbers have been drawn")),

            // StopAutomatic never fails
            (Running, StopAutomatic) => Ok(Stopped),
            (status, StopAutomatic) => Ok(status),

            // Exhaust: last number drawn
            (Exhausted, Exhaust) => Err(invalid("Already exhausted")),
            (_, Exhaust) => Ok(Exhausted),
        }
    }

    pub fn can_draw(&self) -> bool {
        self.status.can_draw()
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initial_state() {
        let machine = StatusMachine::new();
        assert_eq!(machine.status(), GameStatus::Idle);
        assert!(machine.can_draw());
        assert!(!machine.is_running());
    }

    #[test]
    fn test_manual_draw_flow() {
        let mut machine = StatusMachine::new();

        machine.apply_mut(GameEvent::Draw).unwrap();
        assert_eq!(machine.status(), GameStatus::Stopped);

        machine.apply_mut(GameEvent::Draw).unwrap();
        assert_eq!(machine.status(), GameStatus::Stopped);
    }

    #[test]
    fn test_automatic_flow() {
        let mut machine = StatusMachine::new();

        machine.apply_mut(GameEvent::StartAutomatic).unwrap();
        assert!(machine.is_running());

        // Idempotent start
        machine.apply_mut(GameEvent::StartAutomatic).unwrap();
        assert!(machine.is_running());

        machine.apply_mut(GameEvent::Draw).unwrap();
        assert!(machine.is_running());

        machine.apply_mut(GameEvent::StopAutomatic).unwrap();
        assert_eq!(machine.status(), GameStatus::Stopped);

        // Idempotent stop
        machine.apply_mut(GameEvent::StopAutomatic).unwrap();
        assert_eq!(machine.status(), GameStatus::Stopped);
    }

    #[test]
    fn test_exhaustion_is_terminal() {
        let mut machine = StatusMachine::at(GameStatus::Running);
        machine.apply_mut(GameEvent::Exhaust).unwrap();
        assert!(machine.status().is_terminal());

        let err = machine.apply(GameEvent::Draw).unwrap_err();
        assert_eq!(err.from, GameStatus::Exhausted);
        assert!(machine.apply(GameEvent::StartAutomatic).is_err());
        assert!(machine.apply(GameEvent::Exhaust).is_err());
        assert_eq!(
            machine.apply(GameEvent::StopAutomatic).unwrap().status(),
            GameStatus::Exhausted
        );
    }

    #[test]
    fn test_reset_from_any_state() {
        for status in [
            GameStatus::Idle,
            GameStatus::Running,
            GameStatus::Stopped,
            GameStatus::Exhausted,
        ] {
            let machine = StatusMachine::at(status);
            assert_eq!(
                machine.apply(GameEvent::Reset).unwrap().status(),
                GameStatus::Idle
            );
        }
    }

    #[test]
    fn test_display() {
        let err = StatusMachine::at(GameStatus::Exhausted)
            .apply(GameEvent::Draw)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid transition from exhausted via Draw: All numbers have been drawn"
        );
    }
}
