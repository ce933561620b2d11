//! Cancellable timer handles backing the elapsed ticker, the per-round
//! countdown, and the practice-mode auto-advance delay.

use tokio::task::JoinHandle;

/// Slot holding at most one scheduled timer task.
///
/// Arming the slot aborts whatever was armed before, so a stale callback can
/// never outlive the round that scheduled it. Cancelling an empty or
/// already-cancelled slot is a no-op.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Install a new scheduled task, cancelling the previous one first.
    pub fn arm(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(handle);
    }

    /// Abort the scheduled task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a task is currently scheduled in this slot.
    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// One slot per timer kind the engine schedules.
#[derive(Debug, Default)]
pub struct RoundTimers {
    /// Whole-session 1 Hz elapsed ticker.
    pub elapsed: TimerSlot,
    /// First-round presentation delay after a session start.
    pub starter: TimerSlot,
    /// Per-round reveal countdown.
    pub countdown: TimerSlot,
    /// Practice-mode auto-advance delay after a countdown reveal.
    pub advance: TimerSlot,
}

impl RoundTimers {
    /// Cancel every outstanding timer, used when a session ends.
    pub fn cancel_all(&mut self) {
        self.elapsed.cancel();
        self.starter.cancel();
        self.countdown.cancel();
        self.advance.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let mut slot = TimerSlot::default();
        slot.arm(tokio::spawn(async {
            sleep(Duration::from_secs(60)).await;
        }));
        assert!(slot.is_armed());

        slot.cancel();
        slot.cancel();
        assert!(!slot.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn arming_replaces_the_previous_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut slot = TimerSlot::default();

        slot.arm(tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            let _ = tx.send(());
        }));
        slot.arm(tokio::spawn(async {
            sleep(Duration::from_secs(60)).await;
        }));

        // The first task was aborted, so its sender is dropped without firing.
        sleep(Duration::from_secs(5)).await;
        assert!(rx.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_clears_every_kind() {
        let mut timers = RoundTimers::default();
        timers.elapsed.arm(tokio::spawn(async {
            sleep(Duration::from_secs(60)).await;
        }));
        timers.countdown.arm(tokio::spawn(async {
            sleep(Duration::from_secs(60)).await;
        }));
        timers.advance.arm(tokio::spawn(async {
            sleep(Duration::from_secs(60)).await;
        }));

        timers.cancel_all();
        assert!(!timers.elapsed.is_armed());
        assert!(!timers.countdown.is_armed());
        assert!(!timers.advance.is_armed());
    }
}
