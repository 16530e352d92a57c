//! Single-flight build coordination.
//!
//! At most one build cycle runs at a time. A caller arriving while a cycle is
//! in flight does not start its own: it blocks until that cycle finishes and
//! returns the same result.
//!
//! ```text
//! request A ──► run ──► [ cycle #3 ............ ] ──► Ok
//! request B ──────► wait ─────────────────────────► Ok (shared from #3)
//! request C ──────────────────────────────────────► run ──► [ cycle #4 ]
//! ```

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

use super::BuildError;

/// Result shared by every caller of one cycle.
pub type SharedResult = Result<(), Arc<BuildError>>;

#[derive(Default)]
struct GateState {
    /// Number of cycles started so far; the id of the latest cycle.
    started: u64,
    /// Id of the latest finished cycle.
    finished: u64,
    /// Result of the latest finished cycle.
    last: Option<SharedResult>,
    /// Callers blocked on the running cycle.
    waiters: usize,
}

impl GateState {
    fn running(&self) -> bool {
        self.started > self.finished
    }
}

#[derive(Default)]
pub struct BuildGate {
    state: Mutex<GateState>,
    done: Condvar,
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `build` unless a cycle is already in flight, in which case wait
    /// for it and return its result.
    ///
    /// `build` receives the cycle number (starting at 1).
    pub fn run<F>(&self, build: F) -> SharedResult
    where
        F: FnOnce(u64) -> Result<(), BuildError>,
    {
        let mut state = self.state.lock();
        if state.running() {
            let target = state.started;
            state.waiters += 1;
            while state.finished < target {
                self.done.wait(&mut state);
            }
            state.waiters -= 1;
            return state.last.clone().unwrap_or(Err(Arc::new(BuildError::Aborted)));
        }

        state.started += 1;
        let mut flight = Flight {
            gate: self,
            generation: state.started,
            result: None,
        };
        drop(state);

        let result = build(flight.generation).map_err(Arc::new);
        flight.result = Some(result.clone());
        result
    }

    /// Number of cycles started so far.
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.state.lock().started
    }

    /// Callers currently blocked on an in-flight cycle.
    #[cfg(test)]
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters
    }

    fn finish(&self, generation: u64, result: SharedResult) {
        let mut state = self.state.lock();
        state.finished = generation;
        state.last = Some(result);
        drop(state);
        self.done.notify_all();
    }
}

/// Publishes the cycle result on drop, so a panicking build still releases
/// its waiters (with [`BuildError::Aborted`]).
struct Flight<'a> {
    gate: &'a BuildGate,
    generation: u64,
    result: Option<SharedResult>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let result = self
            .result
            .take()
            .unwrap_or_else(|| Err(Arc::new(BuildError::Aborted)));
        self.gate.finish(self.generation, result);
    }
}
