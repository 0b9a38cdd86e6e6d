use std::fmt;

use crate::{
    model::{Criticality, Ticks},
    scheduler::SystemMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SimulationStart,
    JobReleased,
    ExecutionStarted,
    Preemption,
    ModeSwitch,
    // LO jobs dropped by a HI-mode sweep
    JobsEvicted,
    JobFinished,
    DeadlineMiss,
    CpuIdle,
    SimulationEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEvent {
    pub tick: Ticks,
    pub kind: EventKind,
    pub detail: String,
    pub mode: SystemMode,
    // Job holding the CPU when the event was logged, or "Idle"
    pub running: String,
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:06}] [{}] [{}] {:?}: {}",
            self.tick, self.mode, self.running, self.kind, self.detail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub tick: Ticks,
    pub task: Option<String>,
    pub criticality: Option<Criticality>,
}

impl TraceEntry {
    pub fn task_label(&self) -> &str {
        self.task.as_deref().unwrap_or("Idle")
    }

    pub fn criticality_label(&self) -> String {
        self.criticality
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn is_idle(&self) -> bool {
        self.task.is_none()
    }
}
