use std::fmt;

use crate::{core::state::JobKey, model::ReadyKey};

// Fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    // Every job runs within C(LO)
    LoMode,
    // HI jobs run their full C(HI), forcing a criticality switch
    HiMode,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoMode => f.pad("LO_MODE"),
            Self::HiMode => f.pad("HI_MODE"),
        }
    }
}

// `Hi` is absorbing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemMode {
    #[default]
    Lo,
    Hi,
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lo => f.pad("LO"),
            Self::Hi => f.pad("HI"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchDecision {
    // Nothing ready; `stopped` is the job that held the CPU, if any
    Idle { stopped: Option<JobKey> },
    Start(JobKey),
    Preempt { from: JobKey, to: JobKey },
    Continue,
}

/// Fixed-priority preemptive arbitration between the running job and the
/// head of the ready queue. Only a strictly smaller priority number
/// preempts; equal priorities leave the running job in place.
pub fn dispatch(
    running: Option<(JobKey, ReadyKey)>,
    head: Option<(JobKey, ReadyKey)>,
) -> DispatchDecision {
    match (running, head) {
        (running, None) => DispatchDecision::Idle {
            stopped: running.map(|(job, _)| job),
        },
        (None, Some((job, _))) => DispatchDecision::Start(job),
        (Some((current, current_key)), Some((next, next_key))) => {
            if next_key.priority < current_key.priority {
                DispatchDecision::Preempt {
                    from: current,
                    to: next,
                }
            } else {
                DispatchDecision::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn key(priority: u32, arrival: u64, task: u64) -> ReadyKey {
        ReadyKey {
            priority,
            arrival,
            task,
        }
    }

    #[test]
    fn dispatch_decisions() {
        let mut jobs: SlotMap<JobKey, ()> = SlotMap::with_key();
        let a = jobs.insert(());
        let b = jobs.insert(());

        assert_eq!(dispatch(None, None), DispatchDecision::Idle { stopped: None });
        assert_eq!(
            dispatch(Some((a, key(2, 0, 1))), None),
            DispatchDecision::Idle { stopped: Some(a) }
        );
        assert_eq!(
            dispatch(None, Some((b, key(1, 0, 2)))),
            DispatchDecision::Start(b)
        );
        assert_eq!(
            dispatch(Some((a, key(2, 0, 1))), Some((b, key(1, 3, 2)))),
            DispatchDecision::Preempt { from: a, to: b }
        );
    }

    #[test]
    fn equal_priority_does_not_preempt() {
        let mut jobs: SlotMap<JobKey, ()> = SlotMap::with_key();
        let a = jobs.insert(());
        let b = jobs.insert(());

        // b arrived earlier, but ties never preempt
        assert_eq!(
            dispatch(Some((a, key(1, 10, 1))), Some((b, key(1, 0, 1)))),
            DispatchDecision::Continue
        );
        assert_eq!(
            dispatch(Some((a, key(1, 0, 1))), Some((a, key(1, 0, 1)))),
            DispatchDecision::Continue
        );
    }
}
