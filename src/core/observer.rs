use super::state::SimState;
use crate::{model::Criticality, scheduler::SystemMode};

/// Debug-time invariant checks, run once at the end of every tick.
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
    saw_hi_mode: bool,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, state: &SimState<'_>) {
        self.step += 1;

        if self.saw_hi_mode {
            debug_assert_eq!(
                state.mode,
                SystemMode::Hi,
                "System mode returned to LO at tick {}",
                state.now
            );
        }

        if state.mode == SystemMode::Hi {
            self.saw_hi_mode = true;
            debug_assert!(
                !state.ready.any_with(Criticality::Lo),
                "LO-criticality job still ready in HI mode at tick {}",
                state.now
            );
            debug_assert!(
                state.mode_switch_at.is_some(),
                "HI mode without a recorded switch time"
            );
        }

        if let Some(key) = state.running {
            debug_assert!(
                state.ready.contains(key),
                "Running job {key:?} missing from ready set"
            );
        }

        debug_assert_eq!(
            state.ready.len(),
            state.ready.queued_len(),
            "Ready set and priority queue disagree"
        );
        for (key, job) in state.ready.iter() {
            debug_assert!(
                state.ready.is_queued(key),
                "Job {key:?} not present in priority queue"
            );
            debug_assert!(
                job.remaining_execution > 0,
                "Finished job {} still ready",
                job.name()
            );
        }
    }
}
