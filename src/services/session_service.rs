//! The session engine: orchestrates the state machine, the round sequence,
//! and the timers behind every user action and timer callback.
//!
//! Every entry point takes the transition gate first, so one action (or one
//! expired timer) finishes its state mutation and rescheduling before the
//! next one can observe anything. Timer callbacks additionally present the
//! round epoch they were armed with and are dropped when it is stale.

use tracing::{debug, info, warn};

use crate::{
    dto::game::{
        AnswerSummary, RoundSummary, SessionDetail, SessionSnapshot, SessionSummary,
        StartSessionRequest,
    },
    dto::sse::SessionStartedEvent,
    error::ServiceError,
    sequence,
    services::{sse_events, timer_service},
    state::{
        SharedState,
        session::{SessionState, TeamId},
        state_machine::{FinishReason, SessionEvent, SessionPhase},
    },
};

/// Result of a reveal or end action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was applied and changed the session.
    Applied,
    /// The action was a no-op in the current phase (stale UI event).
    Ignored,
}

/// Result of a team-score action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// A point was registered and the session advanced.
    Scored {
        /// Team that scored.
        team: TeamId,
        /// That team's new score.
        score: u32,
        /// Whether this score consumed the final round.
        finished: bool,
    },
    /// The answer was still hidden; the click revealed it instead of scoring.
    RevealedInstead,
    /// Nothing happened: unknown team, or no scorable round.
    Ignored,
}

/// Start a new session over the filtered catalog.
///
/// Valid from idle and from a finished session. A filter combination that
/// matches nothing leaves the engine idle and reports
/// [`ServiceError::EmptySelection`].
pub async fn start_session(
    state: &SharedState,
    request: StartSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;

    match state.phase().await {
        SessionPhase::Idle | SessionPhase::Ended => {}
        other => {
            return Err(ServiceError::InvalidState(format!(
                "cannot start a session while in phase {other:?}"
            )));
        }
    }

    let criteria = request.criteria();
    let countries = state.catalog().filter(&criteria);
    if countries.is_empty() {
        return Err(ServiceError::EmptySelection);
    }

    let order = sequence::generate(countries.len(), request.shuffle, &mut rand::rng());
    let session = SessionState::new(countries, order, criteria.game_mode, criteria.practice);
    let summary = SessionSummary {
        session_id: session.id,
        total_rounds: session.total_rounds(),
        game_mode: session.game_mode,
        practice: session.practice,
        shuffled: request.shuffle,
        countdown_secs: state.config().countdown_secs(session.practice),
    };

    state.apply_event(SessionEvent::Start).await?;
    state.install_session(session).await;

    let epoch = state.bump_epoch();
    {
        let mut timers = state.timers().lock().await;
        timers.cancel_all();
        timers.elapsed.arm(timer_service::spawn_elapsed_ticker(state));
        timers
            .starter
            .arm(timer_service::spawn_first_round(state, epoch));
    }

    info!(
        session_id = %summary.session_id,
        rounds = summary.total_rounds,
        game_mode = ?summary.game_mode,
        practice = summary.practice,
        "session started"
    );

    let snapshot = state.machine_snapshot().await;
    sse_events::broadcast_phase_changed(state, snapshot.into());
    sse_events::broadcast_session_started(
        state,
        &SessionStartedEvent {
            session_id: summary.session_id,
            total_rounds: summary.total_rounds,
            game_mode: summary.game_mode,
            practice: summary.practice,
        },
    );

    Ok(summary)
}

/// Expose the current round's answer on explicit user request.
pub async fn reveal(state: &SharedState) -> Result<ActionOutcome, ServiceError> {
    let _gate = state.transition_gate().lock().await;

    match state.phase().await {
        SessionPhase::RoundActive => {
            reveal_locked(state, true).await?;
            Ok(ActionOutcome::Applied)
        }
        // Stale UI bindings fire these; they are expected no-ops.
        _ => Ok(ActionOutcome::Ignored),
    }
}

/// Register a point for a team, advancing the session.
///
/// A click while the answer is still hidden is reinterpreted as a reveal
/// request and does not score: the first click reveals, the second
/// registers. Unknown teams never score and never transition.
pub async fn score_team(
    state: &SharedState,
    team: Option<TeamId>,
) -> Result<ScoreOutcome, ServiceError> {
    let _gate = state.transition_gate().lock().await;

    let Some(team) = team else {
        return Ok(ScoreOutcome::Ignored);
    };

    match state.phase().await {
        SessionPhase::RoundActive => {
            reveal_locked(state, true).await?;
            Ok(ScoreOutcome::RevealedInstead)
        }
        SessionPhase::RoundRevealed => score_revealed_locked(state, team, true).await,
        SessionPhase::Idle | SessionPhase::Ended => Ok(ScoreOutcome::Ignored),
    }
}

/// Terminate the running session and publish the final standing.
pub async fn end_session(state: &SharedState) -> Result<ActionOutcome, ServiceError> {
    let _gate = state.transition_gate().lock().await;

    match state.phase().await {
        SessionPhase::RoundActive | SessionPhase::RoundRevealed => {
            finish_locked(state, FinishReason::ManualStop).await?;
            Ok(ActionOutcome::Applied)
        }
        SessionPhase::Idle | SessionPhase::Ended => Ok(ActionOutcome::Ignored),
    }
}

/// Read-only snapshot of the engine for the polling endpoint.
pub async fn snapshot(state: &SharedState) -> SessionSnapshot {
    let machine = state.machine_snapshot().await;
    let phase = machine.phase;

    let session = state
        .read_session(|session| SessionDetail {
            session_id: session.id,
            current_index: session.current_index,
            total_rounds: session.total_rounds(),
            scores: session.scores.into(),
            game_mode: session.game_mode,
            practice: session.practice,
            round: session.current_country().map(|country| RoundSummary {
                round: session.current_index + 1,
                total: session.total_rounds(),
                flag_url: country.flag_url.clone(),
                answer: (phase == SessionPhase::RoundRevealed)
                    .then(|| AnswerSummary::for_round(country, session.game_mode)),
            }),
        })
        .await;

    SessionSnapshot {
        phase: machine.into(),
        session,
    }
}

/// Timer callback: present the first round once the start delay elapsed.
pub(crate) async fn present_round(state: &SharedState, epoch: u64) {
    let _gate = state.transition_gate().lock().await;

    if epoch != state.current_epoch() {
        debug!(epoch, current = state.current_epoch(), "ignoring stale round presentation");
        return;
    }
    if state.phase().await != SessionPhase::RoundActive {
        return;
    }

    present_round_locked(state).await;
}

/// Timer callback: the countdown reached zero while its round was active.
pub(crate) async fn handle_countdown_expired(state: &SharedState, epoch: u64) {
    let _gate = state.transition_gate().lock().await;

    if epoch != state.current_epoch() {
        debug!(epoch, current = state.current_epoch(), "ignoring stale countdown expiry");
        return;
    }
    if state.phase().await != SessionPhase::RoundActive {
        return;
    }

    if let Err(err) = reveal_locked(state, false).await {
        warn!(error = %err, "countdown reveal failed");
        return;
    }

    // Practice sessions advance themselves: nobody buzzed in, so the draw
    // slot claims the round after a short follow-up delay.
    let practice = state
        .read_session(|session| session.practice)
        .await
        .unwrap_or(false);
    if practice {
        let handle = timer_service::spawn_auto_advance(state, epoch);
        state.timers().lock().await.advance.arm(handle);
    }
}

/// Timer callback: practice-mode follow-up scoring the draw slot.
pub(crate) async fn auto_advance(state: &SharedState, epoch: u64) {
    let _gate = state.transition_gate().lock().await;

    if epoch != state.current_epoch() {
        debug!(epoch, current = state.current_epoch(), "ignoring stale auto-advance");
        return;
    }
    if state.phase().await != SessionPhase::RoundRevealed {
        return;
    }

    if let Err(err) = score_revealed_locked(state, TeamId::Draw, false).await {
        warn!(error = %err, "practice auto-advance failed");
    }
}

/// Present the current round and arm its countdown. Gate must be held.
async fn present_round_locked(state: &SharedState) {
    let epoch = state.bump_epoch();

    let presented = state
        .read_session(|session| {
            session.current_country().map(|country| {
                (
                    session.current_index + 1,
                    session.total_rounds(),
                    country.flag_url.clone(),
                    session.practice,
                )
            })
        })
        .await
        .flatten();

    let Some((round, total, flag_url, practice)) = presented else {
        warn!("no presentable round in the active session");
        return;
    };

    let countdown_secs = state.config().countdown_secs(practice);
    sse_events::broadcast_round_presented(state, round, total, flag_url, countdown_secs);

    let handle = timer_service::spawn_countdown(state, epoch, countdown_secs);
    state.timers().lock().await.countdown.arm(handle);
}

/// Apply the reveal transition and publish the answer. Gate must be held.
///
/// `cancel_countdown` is false on the expiry path: there the running
/// countdown task is the very handle in the slot, and it finishes on its
/// own right after this call.
async fn reveal_locked(state: &SharedState, cancel_countdown: bool) -> Result<(), ServiceError> {
    state.apply_event(SessionEvent::Reveal).await?;

    if cancel_countdown {
        state.timers().lock().await.countdown.cancel();
    }

    let snapshot = state.machine_snapshot().await;
    sse_events::broadcast_phase_changed(state, snapshot.into());

    let revealed = state
        .read_session(|session| {
            session.current_country().map(|country| {
                (
                    session.current_index + 1,
                    AnswerSummary::for_round(country, session.game_mode),
                )
            })
        })
        .await
        .flatten();
    if let Some((round, answer)) = revealed {
        sse_events::broadcast_round_revealed(state, round, answer);
    }

    Ok(())
}

/// Score a revealed round and advance or finish. Gate must be held.
///
/// `cancel_advance` is false when called from the auto-advance task itself.
async fn score_revealed_locked(
    state: &SharedState,
    team: TeamId,
    cancel_advance: bool,
) -> Result<ScoreOutcome, ServiceError> {
    if cancel_advance {
        state.timers().lock().await.advance.cancel();
    }

    let (score, finished) = state
        .with_session_mut(|session| {
            let score = session.scores.increment(team);
            session.advance();
            Ok((score, !session.has_next()))
        })
        .await?;

    sse_events::broadcast_score_updated(state, team, score);

    if finished {
        finish_locked(state, FinishReason::SequenceExhausted).await?;
    } else {
        state.apply_event(SessionEvent::NextRound).await?;
        let snapshot = state.machine_snapshot().await;
        sse_events::broadcast_phase_changed(state, snapshot.into());
        present_round_locked(state).await;
    }

    Ok(ScoreOutcome::Scored {
        team,
        score,
        finished,
    })
}

/// Move to the final scoreboard and stop every timer. Gate must be held.
async fn finish_locked(state: &SharedState, reason: FinishReason) -> Result<(), ServiceError> {
    state.apply_event(SessionEvent::Finish(reason)).await?;
    state.bump_epoch();

    let snapshot = state.machine_snapshot().await;
    sse_events::broadcast_phase_changed(state, snapshot.into());

    if let Some((scores, outcome)) = state
        .read_session(|session| (session.scores, session.scores.outcome()))
        .await
    {
        info!(
            ?reason,
            ?outcome,
            red = scores.red,
            draw = scores.draw,
            green = scores.green,
            "session finished"
        );
        sse_events::broadcast_session_finished(state, scores.into(), outcome.into(), reason);
    }

    // Cancelling last: on the practice path the advance task is running this
    // very function, and an abort must not cut off the broadcasts above.
    state.timers().lock().await.cancel_all();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{sync::broadcast::error::TryRecvError, time::sleep};

    use super::*;
    use crate::{
        catalog::{CountryCatalog, CountryRecord, GameMode, SovereigntyFilter},
        config::AppConfig,
        dto::sse::ServerEvent,
        state::AppState,
    };

    fn country(index: usize) -> CountryRecord {
        CountryRecord {
            continent: "Europe".into(),
            english_name: format!("Country {index}"),
            local_name: format!("País {index}"),
            flag_url: format!("https://flags.example/{index}.svg"),
            sovereign: true,
            capital: Some(format!("Capital {index}")),
        }
    }

    fn shared_state(countries: usize) -> SharedState {
        let catalog =
            CountryCatalog::from_records((0..countries).map(country).collect());
        AppState::new(AppConfig::default(), catalog)
    }

    fn request(shuffle: bool, practice: bool) -> StartSessionRequest {
        StartSessionRequest {
            continent: "All".into(),
            sovereignty: SovereigntyFilter::All,
            max_count: None,
            game_mode: GameMode::Flags,
            practice,
            shuffle,
        }
    }

    /// Start a session and let the first-round delay elapse.
    async fn start_and_present(state: &SharedState, shuffle: bool, practice: bool) {
        start_session(state, request(shuffle, practice)).await.unwrap();
        sleep(state.config().first_round_delay() + Duration::from_millis(50)).await;
    }

    fn drain(
        receiver: &mut tokio::sync::broadcast::Receiver<ServerEvent>,
    ) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        events
    }

    fn count_named(events: &[ServerEvent], name: &str) -> usize {
        events
            .iter()
            .filter(|event| event.event.as_deref() == Some(name))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn unshuffled_session_plays_the_identity_sequence() {
        let state = shared_state(5);
        start_and_present(&state, false, false).await;

        let order = state.read_session(|s| s.sequence.clone()).await.unwrap();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);

        for _ in 0..3 {
            assert_eq!(reveal(&state).await.unwrap(), ActionOutcome::Applied);
            let outcome = score_team(&state, Some(TeamId::Red)).await.unwrap();
            assert!(matches!(outcome, ScoreOutcome::Scored { team: TeamId::Red, .. }));
        }

        let (red, draw, green, index) = state
            .read_session(|s| (s.scores.red, s.scores.draw, s.scores.green, s.current_index))
            .await
            .unwrap();
        assert_eq!(red, 3);
        assert_eq!(draw, 0);
        assert_eq!(green, 0);
        assert_eq!(index, 3);
        assert_eq!(state.phase().await, SessionPhase::RoundActive);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_selection_reports_error_and_stays_idle() {
        let state = shared_state(5);
        let mut start = request(true, false);
        start.continent = "Atlantis".into();

        let err = start_session(&state, start).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptySelection));
        assert_eq!(state.phase().await, SessionPhase::Idle);
        assert!(state.read_session(|s| s.id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn first_team_click_reveals_instead_of_scoring() {
        let state = shared_state(3);
        start_and_present(&state, false, false).await;

        let outcome = score_team(&state, Some(TeamId::Green)).await.unwrap();
        assert_eq!(outcome, ScoreOutcome::RevealedInstead);
        assert_eq!(state.phase().await, SessionPhase::RoundRevealed);
        let green = state.read_session(|s| s.scores.green).await.unwrap();
        assert_eq!(green, 0);

        let outcome = score_team(&state, Some(TeamId::Green)).await.unwrap();
        assert_eq!(
            outcome,
            ScoreOutcome::Scored {
                team: TeamId::Green,
                score: 1,
                finished: false
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_team_and_idle_actions_are_ignored() {
        let state = shared_state(3);

        assert_eq!(reveal(&state).await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(end_session(&state).await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(
            score_team(&state, Some(TeamId::Red)).await.unwrap(),
            ScoreOutcome::Ignored
        );

        start_and_present(&state, false, false).await;
        reveal(&state).await.unwrap();

        assert_eq!(score_team(&state, None).await.unwrap(), ScoreOutcome::Ignored);
        let index = state.read_session(|s| s.current_index).await.unwrap();
        assert_eq!(index, 0);
        assert_eq!(TeamId::parse("purple"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_produces_exactly_one_reveal() {
        let state = shared_state(3);
        let mut receiver = state.events().subscribe();
        start_and_present(&state, false, false).await;

        let countdown = state.config().countdown_secs(false);
        sleep(Duration::from_secs(countdown + 1)).await;
        assert_eq!(state.phase().await, SessionPhase::RoundRevealed);

        // A long wait after expiry must not yield another reveal.
        sleep(Duration::from_secs(10)).await;
        let events = drain(&mut receiver);
        assert_eq!(count_named(&events, "round.revealed"), 1);
        assert_eq!(state.phase().await, SessionPhase::RoundRevealed);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reveal_cancels_the_countdown() {
        let state = shared_state(3);
        let mut receiver = state.events().subscribe();
        start_and_present(&state, false, false).await;

        assert_eq!(reveal(&state).await.unwrap(), ActionOutcome::Applied);
        let version = state.machine_snapshot().await.version;

        sleep(Duration::from_secs(15)).await;
        let events = drain(&mut receiver);
        assert_eq!(count_named(&events, "round.revealed"), 1);
        assert_eq!(state.machine_snapshot().await.version, version);
    }

    #[tokio::test(start_paused = true)]
    async fn practice_mode_advances_itself_by_one_round() {
        let state = shared_state(3);
        start_and_present(&state, false, true).await;

        let countdown = state.config().countdown_secs(true);
        sleep(Duration::from_secs(countdown + 1)).await;
        assert_eq!(state.phase().await, SessionPhase::RoundRevealed);

        sleep(state.config().auto_advance_delay() + Duration::from_millis(100)).await;
        let (draw, index) = state
            .read_session(|s| (s.scores.draw, s.current_index))
            .await
            .unwrap();
        assert_eq!(draw, 1);
        assert_eq!(index, 1);
        assert_eq!(state.phase().await, SessionPhase::RoundActive);
    }

    #[tokio::test(start_paused = true)]
    async fn practice_session_runs_to_completion_unattended() {
        let state = shared_state(2);
        start_and_present(&state, false, true).await;

        let round = Duration::from_secs(state.config().countdown_secs(true) + 1)
            + state.config().auto_advance_delay()
            + Duration::from_millis(200);
        sleep(round).await;
        sleep(round).await;

        assert_eq!(state.phase().await, SessionPhase::Ended);
        let (draw, index, total) = state
            .read_session(|s| (s.scores.draw, s.current_index, s.total_rounds()))
            .await
            .unwrap();
        assert_eq!(draw, 2);
        assert_eq!(index, total);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_score_cancels_the_pending_auto_advance() {
        let state = shared_state(3);
        start_and_present(&state, false, true).await;

        let countdown = state.config().countdown_secs(true);
        sleep(Duration::from_secs(countdown + 1)).await;
        assert_eq!(state.phase().await, SessionPhase::RoundRevealed);

        // A team beats the follow-up delay; the draw slot must not score.
        let outcome = score_team(&state, Some(TeamId::Red)).await.unwrap();
        assert!(matches!(outcome, ScoreOutcome::Scored { team: TeamId::Red, .. }));

        sleep(state.config().auto_advance_delay() + Duration::from_secs(1)).await;
        let (red, draw, index) = state
            .read_session(|s| (s.scores.red, s.scores.draw, s.current_index))
            .await
            .unwrap();
        assert_eq!(red, 1);
        assert_eq!(draw, 0);
        assert_eq!(index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ending_mid_countdown_silences_every_timer() {
        let state = shared_state(4);
        start_and_present(&state, false, false).await;

        assert_eq!(end_session(&state).await.unwrap(), ActionOutcome::Applied);
        assert_eq!(state.phase().await, SessionPhase::Ended);
        let version = state.machine_snapshot().await.version;

        let mut receiver = state.events().subscribe();
        sleep(Duration::from_secs(30)).await;
        let events = drain(&mut receiver);
        assert!(events.is_empty(), "unexpected events after end: {events:?}");
        assert_eq!(state.machine_snapshot().await.version, version);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_end_resets_scores_and_index() {
        let state = shared_state(3);
        start_and_present(&state, false, false).await;
        reveal(&state).await.unwrap();
        score_team(&state, Some(TeamId::Red)).await.unwrap();
        end_session(&state).await.unwrap();

        start_and_present(&state, false, false).await;
        let (red, draw, green, index) = state
            .read_session(|s| (s.scores.red, s.scores.draw, s.scores.green, s.current_index))
            .await
            .unwrap();
        assert_eq!((red, draw, green, index), (0, 0, 0, 0));
        assert_eq!(state.phase().await, SessionPhase::RoundActive);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_sequence_ends_the_session() {
        let state = shared_state(1);
        let mut receiver = state.events().subscribe();
        start_and_present(&state, false, false).await;

        reveal(&state).await.unwrap();
        let outcome = score_team(&state, Some(TeamId::Red)).await.unwrap();
        assert_eq!(
            outcome,
            ScoreOutcome::Scored {
                team: TeamId::Red,
                score: 1,
                finished: true
            }
        );
        assert_eq!(state.phase().await, SessionPhase::Ended);

        let (index, total) = state
            .read_session(|s| (s.current_index, s.total_rounds()))
            .await
            .unwrap();
        assert_eq!(index, total);

        let events = drain(&mut receiver);
        assert_eq!(count_named(&events, "session.finished"), 1);

        // Scoring past the end is a stale event, not an error.
        assert_eq!(
            score_team(&state, Some(TeamId::Green)).await.unwrap(),
            ScoreOutcome::Ignored
        );
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_ticker_runs_across_round_transitions() {
        let state = shared_state(5);
        let mut receiver = state.events().subscribe();
        start_and_present(&state, false, false).await;
        drain(&mut receiver);

        reveal(&state).await.unwrap();
        score_team(&state, Some(TeamId::Green)).await.unwrap();
        sleep(Duration::from_millis(3100)).await;

        let events = drain(&mut receiver);
        assert!(count_named(&events, "timer.tick") >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn capitals_mode_reveal_carries_the_capital() {
        let state = shared_state(2);
        let mut start = request(false, false);
        start.game_mode = GameMode::Capitals;
        start_session(&state, start).await.unwrap();
        sleep(state.config().first_round_delay() + Duration::from_millis(50)).await;

        reveal(&state).await.unwrap();
        let snapshot = snapshot(&state).await;
        let round = snapshot.session.unwrap().round.unwrap();
        let answer = round.answer.expect("answer visible after reveal");
        assert_eq!(answer.capital.as_deref(), Some("Capital 0"));

        // Advancing hides name and capital together.
        score_team(&state, Some(TeamId::Red)).await.unwrap();
        let next = super::snapshot(&state).await;
        let round = next.session.unwrap().round.unwrap();
        assert!(round.answer.is_none());
    }
}
