//! Shared application state: the session engine's data, its state machine,
//! timer slots, and the event hub feeding SSE subscribers.

pub mod events;
pub mod session;
pub mod state_machine;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{Mutex, RwLock};

use crate::{
    catalog::CountryCatalog,
    config::AppConfig,
    error::ServiceError,
    state::{
        session::SessionState,
        state_machine::{InvalidTransition, SessionEvent, SessionMachine, SessionPhase, Snapshot},
    },
    timer::RoundTimers,
};

pub use self::events::EventHub;

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state owning the session engine's moving parts.
///
/// The engine mutates `session` exclusively, always while holding
/// `transition_gate`, so one user action or timer callback completes its
/// state mutation and rescheduling before the next can observe anything.
pub struct AppState {
    config: AppConfig,
    catalog: CountryCatalog,
    machine: RwLock<SessionMachine>,
    session: RwLock<Option<SessionState>>,
    timers: Mutex<RoundTimers>,
    events: EventHub,
    transition_gate: Mutex<()>,
    round_epoch: AtomicU64,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, catalog: CountryCatalog) -> SharedState {
        Arc::new(Self {
            config,
            catalog,
            machine: RwLock::new(SessionMachine::new()),
            session: RwLock::new(None),
            timers: Mutex::new(RoundTimers::default()),
            events: EventHub::new(128),
            transition_gate: Mutex::new(()),
            round_epoch: AtomicU64::new(0),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The loaded country catalog.
    pub fn catalog(&self) -> &CountryCatalog {
        &self.catalog
    }

    /// Broadcast hub used for the SSE stream.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Gate serializing state transitions and their dependent scheduling.
    pub fn transition_gate(&self) -> &Mutex<()> {
        &self.transition_gate
    }

    /// Slots holding the currently scheduled timer tasks.
    pub fn timers(&self) -> &Mutex<RoundTimers> {
        &self.timers
    }

    /// Snapshot the current phase of the session state machine.
    pub async fn phase(&self) -> SessionPhase {
        self.machine.read().await.phase()
    }

    /// Snapshot phase and version of the session state machine.
    pub async fn machine_snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Apply an event to the session state machine.
    pub(crate) async fn apply_event(
        &self,
        event: SessionEvent,
    ) -> Result<SessionPhase, InvalidTransition> {
        let mut machine = self.machine.write().await;
        machine.apply(event)
    }

    /// Install a fresh session, replacing whatever was there.
    pub(crate) async fn install_session(&self, session: SessionState) {
        let mut slot = self.session.write().await;
        *slot = Some(session);
    }

    /// Run a closure over the active session, or `None` when idle.
    pub async fn read_session<F, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&SessionState) -> T,
    {
        let guard = self.session.read().await;
        guard.as_ref().map(f)
    }

    /// Run a fallible closure over the active session, mutably; an absent
    /// session is an invalid-state error.
    pub(crate) async fn with_session_mut<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut SessionState) -> Result<T, ServiceError>,
    {
        let mut guard = self.session.write().await;
        match guard.as_mut() {
            Some(session) => f(session),
            None => Err(ServiceError::InvalidState("no active session".into())),
        }
    }

    /// The epoch scheduled callbacks must present to be honoured.
    pub fn current_epoch(&self) -> u64 {
        self.round_epoch.load(Ordering::Acquire)
    }

    /// Invalidate every outstanding scheduled callback and return the new epoch.
    pub(crate) fn bump_epoch(&self) -> u64 {
        self.round_epoch.fetch_add(1, Ordering::AcqRel) + 1
    }
}
