//! Cold-start lifecycle.
//!
//! Two one-shot phases guard the first layout passes: process setup runs once
//! per process, repo setup once per repository session. Both are tracked by a
//! single [`Lifecycle`] state machine; a phase only advances the state after
//! every step succeeded, so a failed phase is retried on the next pass.

mod state;

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::{LayoutError, Result};

pub use state::{
    AppState, AppStateStore, JsonStateFile, MemoryStateStore, STARTUP_POPUP_VERSION,
    StartupConfig, StartupPopup, startup_popup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    ProcessReady,
    RepoReady,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn needs_process_setup(&self) -> bool {
        self.state == LifecycleState::Uninitialized
    }

    pub fn needs_repo_setup(&self) -> bool {
        self.state == LifecycleState::ProcessReady
    }

    pub fn mark_process_ready(&mut self) -> Result<()> {
        self.transition(LifecycleState::Uninitialized, LifecycleState::ProcessReady)
    }

    pub fn mark_repo_ready(&mut self) -> Result<()> {
        self.transition(LifecycleState::ProcessReady, LifecycleState::RepoReady)
    }

    /// Re-arm repo setup after the active repository changed.
    pub fn reset_repo(&mut self) {
        if self.state == LifecycleState::RepoReady {
            self.state = LifecycleState::ProcessReady;
        }
    }

    fn transition(&mut self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        if self.state != from {
            return Err(LayoutError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// One-shot signal released when process setup completes. Threads that must
/// not start before the intro popup is decided wait on it.
#[derive(Clone, Default)]
pub struct StartupLatch {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StartupLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut released) = lock.lock() {
            *released = true;
            cvar.notify_all();
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.0.lock().map(|released| *released).unwrap_or(false)
    }

    /// Block until released or `timeout` elapses. Returns whether the latch
    /// was released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let Ok(guard) = lock.lock() else {
            return false;
        };
        match cvar.wait_timeout_while(guard, timeout, |released| !*released) {
            Ok((released, _)) => *released,
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for StartupLatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupLatch")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn phases_advance_in_order() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.needs_process_setup());
        assert!(!lifecycle.needs_repo_setup());

        lifecycle.mark_process_ready().unwrap();
        assert!(lifecycle.needs_repo_setup());

        lifecycle.mark_repo_ready().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::RepoReady);
        assert!(!lifecycle.needs_process_setup());
        assert!(!lifecycle.needs_repo_setup());
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.mark_repo_ready().unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidTransition {
                from: LifecycleState::Uninitialized,
                to: LifecycleState::RepoReady,
            }
        ));

        lifecycle.mark_process_ready().unwrap();
        assert!(lifecycle.mark_process_ready().is_err());
    }

    #[test]
    fn repo_reset_rearms_only_repo_setup() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.reset_repo();
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);

        lifecycle.mark_process_ready().unwrap();
        lifecycle.mark_repo_ready().unwrap();
        lifecycle.reset_repo();
        assert_eq!(lifecycle.state(), LifecycleState::ProcessReady);
        assert!(lifecycle.needs_repo_setup());
        assert!(!lifecycle.needs_process_setup());
    }

    #[test]
    fn latch_releases_waiters() {
        let latch = StartupLatch::new();
        assert!(!latch.wait_timeout(Duration::from_millis(1)));

        let waiter = {
            let latch = latch.clone();
            thread::spawn(move || latch.wait_timeout(Duration::from_secs(5)))
        };
        latch.release();
        assert!(waiter.join().unwrap());
        assert!(latch.is_released());
    }
}
