//! Worker lifecycle as seen by the host runtime.
//!
//! The agent never owns its lifecycle; it can only ask the host to skip the
//! waiting stage and to claim open clients. `LocalHost` is the in-process host
//! used by the server and by tests.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::Serialize;

/// Lifecycle stage of the installed worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorkerState {
    Parsed = 0,
    Installing = 1,
    Installed = 2,
    Activating = 3,
    Activated = 4,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Installing,
            2 => Self::Installed,
            3 => Self::Activating,
            4 => Self::Activated,
            _ => Self::Parsed,
        }
    }
}

/// Capabilities the host grants the agent.
pub trait WorkerHost: Send + Sync {
    /// Leave the waiting stage as soon as installation finishes.
    fn skip_waiting(&self);

    /// Route every open client through this worker from now on.
    fn claim_clients(&self);
}

/// In-process host that records lifecycle transitions.
#[derive(Debug)]
pub struct LocalHost {
    state: AtomicU8,
    skip_waiting: AtomicBool,
    claimed: AtomicBool,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Parsed as u8),
            skip_waiting: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
        }
    }
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `state`. Entering `Installing` starts a fresh install, so an
    /// earlier skip-waiting request is forgotten.
    pub fn set_state(&self, state: WorkerState) {
        if state == WorkerState::Installing {
            self.skip_waiting.store(false, Ordering::Release);
        }
        let previous = WorkerState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        tracing::info!(from = ?previous, to = ?state, "worker state changed");
    }

    /// Whether the agent asked to skip waiting since it was installed.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    pub fn clients_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

impl WorkerHost for LocalHost {
    fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::Release);
    }

    fn claim_clients(&self) {
        self.claimed.store(true, Ordering::Release);
    }
}
