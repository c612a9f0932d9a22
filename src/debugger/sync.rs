use std::sync::{Condvar, MutexGuard, PoisonError};
use std::time::Duration;

/// Pause/resume synchronizer.
///
/// Both condition variables are always used with the debugger state mutex, so "release
/// lock, block, reacquire lock" is atomic with respect to any state change made under that
/// mutex. Callers must re-check their predicate after every return (wake-ups may be spurious
/// or caused by [`PauseGate::pulse`]).
#[derive(Default)]
pub(super) struct PauseGate {
    /// Wakes controllers waiting for the system to converge to a paused state.
    wake: Condvar,
    /// Lets parked workers proceed.
    permission: Condvar,
}

impl PauseGate {
    /// Notify controllers that pause state possibly changed.
    pub(super) fn wake(&self) {
        self.wake.notify_all();
    }

    /// Park current (worker) thread until permission is granted.
    /// State lock is released while thread is blocked.
    pub(super) fn park<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.wake.notify_all();
        self.permission
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Release every parked worker.
    pub(super) fn release_all(&self) {
        self.permission.notify_all();
    }

    /// Wake every parked worker so it re-checks whether it must stay parked.
    /// Semantically equal to [`PauseGate::release_all`], pause state is not changed,
    /// so workers that are still attached park again.
    pub(super) fn pulse(&self) {
        self.permission.notify_all();
    }

    /// Block current (controller) thread until a wake notification or timeout.
    pub(super) fn wait_wake<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
    ) -> MutexGuard<'a, T> {
        match self.wake.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}
