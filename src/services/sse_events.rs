//! Typed broadcast helpers pushing engine notifications onto the event hub.

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::{AnswerSummary, OutcomeSummary, ScoreboardSummary},
        phase::PhaseSnapshot,
        sse::{
            CountdownTickEvent, ElapsedTickEvent, PhaseChangedEvent, RoundPresentedEvent,
            RoundRevealedEvent, ScoreUpdatedEvent, ServerEvent, SessionFinishedEvent,
            SessionStartedEvent,
        },
    },
    state::{SharedState, session::TeamId, state_machine::FinishReason},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_SESSION_STARTED: &str = "session.started";
const EVENT_ROUND_PRESENTED: &str = "round.presented";
const EVENT_ROUND_REVEALED: &str = "round.revealed";
const EVENT_SCORE_UPDATED: &str = "score.updated";
const EVENT_ELAPSED_TICK: &str = "timer.tick";
const EVENT_COUNTDOWN_TICK: &str = "countdown.tick";
const EVENT_SESSION_FINISHED: &str = "session.finished";

/// Broadcast a session phase change notification.
pub fn broadcast_phase_changed(state: &SharedState, snapshot: PhaseSnapshot) {
    send_event(state, EVENT_PHASE_CHANGED, &PhaseChangedEvent(snapshot));
}

/// Broadcast that a new session has started.
pub fn broadcast_session_started(state: &SharedState, payload: &SessionStartedEvent) {
    send_event(state, EVENT_SESSION_STARTED, payload);
}

/// Broadcast the presentation of a round (flag visible, answer hidden).
pub fn broadcast_round_presented(
    state: &SharedState,
    round: usize,
    total: usize,
    flag_url: String,
    countdown_secs: u64,
) {
    let payload = RoundPresentedEvent {
        round,
        total,
        flag_url,
        countdown_secs,
    };
    send_event(state, EVENT_ROUND_PRESENTED, &payload);
}

/// Broadcast the reveal of the current round's answer.
pub fn broadcast_round_revealed(state: &SharedState, round: usize, answer: AnswerSummary) {
    let payload = RoundRevealedEvent { round, answer };
    send_event(state, EVENT_ROUND_REVEALED, &payload);
}

/// Broadcast a score change for one team.
pub fn broadcast_score_updated(state: &SharedState, team: TeamId, score: u32) {
    let payload = ScoreUpdatedEvent { team, score };
    send_event(state, EVENT_SCORE_UPDATED, &payload);
}

/// Broadcast one elapsed-timer tick.
pub fn broadcast_elapsed_tick(state: &SharedState, seconds: u64) {
    send_event(state, EVENT_ELAPSED_TICK, &ElapsedTickEvent { seconds });
}

/// Broadcast one countdown tick.
pub fn broadcast_countdown_tick(state: &SharedState, remaining: u64) {
    send_event(state, EVENT_COUNTDOWN_TICK, &CountdownTickEvent { remaining });
}

/// Broadcast the final scoreboard and standing.
pub fn broadcast_session_finished(
    state: &SharedState,
    scores: ScoreboardSummary,
    outcome: OutcomeSummary,
    reason: FinishReason,
) {
    let reason = match reason {
        FinishReason::SequenceExhausted => "completed",
        FinishReason::ManualStop => "stopped",
    };
    let payload = SessionFinishedEvent {
        scores,
        outcome,
        reason: reason.to_string(),
    };
    send_event(state, EVENT_SESSION_FINISHED, &payload);
}

fn send_event<T: Serialize>(state: &SharedState, event: &str, payload: &T) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(server_event) => state.events().broadcast(server_event),
        Err(err) => warn!(event, error = %err, "failed to serialise server event"),
    }
}
