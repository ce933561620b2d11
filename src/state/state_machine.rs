use thiserror::Error;

/// High-level phases a quiz session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session is running; filters can be adjusted freely.
    Idle,
    /// A flag is displayed with its answer hidden and the countdown running.
    RoundActive,
    /// The answer is visible, the countdown is stopped, scoring is enabled.
    RoundRevealed,
    /// The session is over and the final scoreboard is displayed.
    Ended,
}

/// Indicates why a session transitioned to its final scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every round in the sequence has been played.
    SequenceExhausted,
    /// A player ended the session early.
    ManualStop,
}

/// Events that can be applied to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Begin a new session; valid from idle and from a finished session.
    Start,
    /// Expose the current round's answer, manually or by countdown expiry.
    Reveal,
    /// Move to the next round after a team scored.
    NextRound,
    /// Terminate the session.
    Finish(FinishReason),
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event arrived.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: SessionPhase,
    /// Version number, incremented on each applied transition.
    pub version: usize,
}

/// State machine implementing the session lifecycle.
///
/// All transitions run synchronously under the engine's transition gate, so
/// the machine itself only validates and applies events.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    phase: SessionPhase,
    version: usize,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            version: 0,
        }
    }
}

impl SessionMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Validate and apply an event, returning the phase it led to.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute the successor phase for an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            // Starting over from a finished session behaves exactly like
            // starting from idle.
            (SessionPhase::Idle | SessionPhase::Ended, SessionEvent::Start) => {
                SessionPhase::RoundActive
            }
            (SessionPhase::RoundActive, SessionEvent::Reveal) => SessionPhase::RoundRevealed,
            (SessionPhase::RoundRevealed, SessionEvent::NextRound) => SessionPhase::RoundActive,
            (
                SessionPhase::RoundActive | SessionPhase::RoundRevealed,
                SessionEvent::Finish(..),
            ) => SessionPhase::Ended,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionMachine, event: SessionEvent) -> SessionPhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = SessionMachine::new();
        assert_eq!(sm.phase(), SessionPhase::Idle);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = SessionMachine::new();

        assert_eq!(apply(&mut sm, SessionEvent::Start), SessionPhase::RoundActive);
        assert_eq!(apply(&mut sm, SessionEvent::Reveal), SessionPhase::RoundRevealed);
        assert_eq!(
            apply(&mut sm, SessionEvent::NextRound),
            SessionPhase::RoundActive
        );
        assert_eq!(apply(&mut sm, SessionEvent::Reveal), SessionPhase::RoundRevealed);
        assert_eq!(
            apply(&mut sm, SessionEvent::Finish(FinishReason::SequenceExhausted)),
            SessionPhase::Ended
        );
        assert_eq!(sm.snapshot().version, 5);
    }

    #[test]
    fn restart_from_ended_behaves_like_idle() {
        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::Start);
        apply(&mut sm, SessionEvent::Finish(FinishReason::ManualStop));

        assert_eq!(apply(&mut sm, SessionEvent::Start), SessionPhase::RoundActive);
    }

    #[test]
    fn manual_stop_is_valid_mid_countdown_and_after_reveal() {
        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::Start);
        assert_eq!(
            apply(&mut sm, SessionEvent::Finish(FinishReason::ManualStop)),
            SessionPhase::Ended
        );

        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::Start);
        apply(&mut sm, SessionEvent::Reveal);
        assert_eq!(
            apply(&mut sm, SessionEvent::Finish(FinishReason::ManualStop)),
            SessionPhase::Ended
        );
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut sm = SessionMachine::new();
        let err = sm.apply(SessionEvent::Reveal).unwrap_err();
        assert_eq!(err.from, SessionPhase::Idle);
        assert_eq!(err.event, SessionEvent::Reveal);

        apply(&mut sm, SessionEvent::Start);
        // Scoring before a reveal is not a machine transition at all; the
        // engine reinterprets it. A second reveal in a row is invalid.
        apply(&mut sm, SessionEvent::Reveal);
        assert!(sm.apply(SessionEvent::Reveal).is_err());
        assert!(sm.apply(SessionEvent::Start).is_err());
    }

    #[test]
    fn version_increments_once_per_applied_event() {
        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::Start);
        let before = sm.snapshot().version;
        let _ = sm.apply(SessionEvent::Start).unwrap_err();
        assert_eq!(sm.snapshot().version, before);
    }
}
