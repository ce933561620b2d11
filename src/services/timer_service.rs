//! Spawned tokio tasks behind the engine's timer slots.
//!
//! Every task carries the round epoch observed when it was armed; the
//! session service refuses callbacks whose epoch is stale, so an aborted or
//! superseded timer can never mutate a later round's state.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval, sleep},
};

use crate::{
    services::{session_service, sse_events},
    state::SharedState,
};

/// Period of both the elapsed ticker and the countdown.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Schedule the first round presentation after the configured start delay.
pub fn spawn_first_round(state: &SharedState, epoch: u64) -> JoinHandle<()> {
    let state = state.clone();
    let delay = state.config().first_round_delay();
    tokio::spawn(async move {
        sleep(delay).await;
        session_service::present_round(&state, epoch).await;
    })
}

/// Run the whole-session elapsed ticker, broadcasting once per second.
///
/// The seconds counter lives inside the task; it resets by virtue of the
/// task being replaced at the next session start.
pub fn spawn_elapsed_ticker(state: &SharedState) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seconds: u64 = 0;
        loop {
            ticker.tick().await;
            sse_events::broadcast_elapsed_tick(&state, seconds);
            seconds += 1;
        }
    })
}

/// Run one round's reveal countdown from `secs` down to zero.
///
/// Each remaining value is broadcast, then the expiry is handed to the
/// session service which performs the automatic reveal exactly once.
pub fn spawn_countdown(state: &SharedState, epoch: u64, secs: u64) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        let mut remaining = secs;
        sse_events::broadcast_countdown_tick(&state, remaining);
        while remaining > 0 {
            sleep(TICK_PERIOD).await;
            remaining -= 1;
            sse_events::broadcast_countdown_tick(&state, remaining);
        }
        session_service::handle_countdown_expired(&state, epoch).await;
    })
}

/// Schedule the practice-mode draw-slot advance after a countdown reveal.
pub fn spawn_auto_advance(state: &SharedState, epoch: u64) -> JoinHandle<()> {
    let state = state.clone();
    let delay = state.config().auto_advance_delay();
    tokio::spawn(async move {
        sleep(delay).await;
        session_service::auto_advance(&state, epoch).await;
    })
}
