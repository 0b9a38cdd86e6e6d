use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{error::ConfigError, scheduler::Scenario};

pub type Ticks = u64;
pub type TaskId = u64;
// Lower number = higher priority
pub type Priority = u32;

pub const MAX_TICKS: Ticks = i64::MAX as Ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Criticality {
    Lo,
    Hi,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lo => f.pad("LO"),
            Self::Hi => f.pad("HI"),
        }
    }
}

// `wcet_hi` is present iff `criticality == Hi`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub period: Ticks,
    pub deadline: Ticks,
    pub wcet_lo: Ticks,
    pub wcet_hi: Option<Ticks>,
    pub criticality: Criticality,
    pub priority: Priority,
}

impl Task {
    pub fn new_lo(
        id: TaskId,
        name: impl Into<String>,
        period: Ticks,
        wcet_lo: Ticks,
        priority: Priority,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            period,
            deadline: period,
            wcet_lo,
            wcet_hi: None,
            criticality: Criticality::Lo,
            priority,
        }
    }

    pub fn new_hi(
        id: TaskId,
        name: impl Into<String>,
        period: Ticks,
        wcet_lo: Ticks,
        wcet_hi: Ticks,
        priority: Priority,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            period,
            deadline: period,
            wcet_lo,
            wcet_hi: Some(wcet_hi),
            criticality: Criticality::Hi,
            priority,
        }
    }

    pub fn with_deadline(mut self, deadline: Ticks) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn is_hi(&self) -> bool {
        self.criticality == Criticality::Hi
    }

    pub fn hi_wcet(&self) -> Result<Ticks, ConfigError> {
        self.wcet_hi
            .ok_or(ConfigError::MissingHiWcet { task: self.id })
    }

    /// Execution demand of a job released under `scenario`: HI tasks run
    /// their full HI budget in the HI scenario, everything else runs C(LO).
    pub fn budget(&self, scenario: Scenario) -> Ticks {
        match (scenario, self.criticality, self.wcet_hi) {
            (Scenario::HiMode, Criticality::Hi, Some(wcet_hi)) => wcet_hi,
            _ => self.wcet_lo,
        }
    }

    pub fn utilization(&self) -> f64 {
        self.wcet_lo as f64 / self.period as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("period", self.period),
            ("deadline", self.deadline),
            ("wcet_lo", self.wcet_lo),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroParameter {
                    task: self.id,
                    field,
                });
            }
        }

        // Saturated response times must exceed every deadline; C(LO) must fit an i64
        for (field, value) in [
            ("period", Some(self.period)),
            ("deadline", Some(self.deadline)),
            ("wcet_lo", Some(self.wcet_lo)),
            ("wcet_hi", self.wcet_hi),
        ] {
            if let Some(value) = value.filter(|&v| v > MAX_TICKS) {
                return Err(ConfigError::ParameterTooLarge {
                    task: self.id,
                    field,
                    value,
                });
            }
        }

        match (self.criticality, self.wcet_hi) {
            (Criticality::Hi, None) => Err(ConfigError::MissingHiWcet { task: self.id }),
            (Criticality::Lo, Some(_)) => Err(ConfigError::UnexpectedHiWcet { task: self.id }),
            (Criticality::Hi, Some(hi)) if hi < self.wcet_lo => Err(ConfigError::HiWcetBelowLo {
                task: self.id,
                lo: self.wcet_lo,
                hi,
            }),
            _ => Ok(()),
        }
    }
}

pub fn validate_task_set(tasks: &[Task]) -> Result<(), ConfigError> {
    if tasks.is_empty() {
        return Err(ConfigError::EmptyTaskSet);
    }

    let mut seen = FxHashSet::default();
    for task in tasks {
        task.validate()?;
        if !seen.insert(task.id) {
            return Err(ConfigError::DuplicateTaskId { id: task.id });
        }
    }
    Ok(())
}

/// `tasks` in priority order, highest first. Equal priority
/// numbers fall back to task id so the order is total.
pub fn priority_order(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
    ordered
}

pub fn simulation_horizon(tasks: &[Task]) -> Ticks {
    tasks
        .iter()
        .map(|t| t.period)
        .max()
        .unwrap_or(0)
        .saturating_mul(2)
}
