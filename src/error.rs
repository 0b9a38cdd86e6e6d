use thiserror::Error;

use crate::model::TaskId;

// Unschedulability and deadline misses are results, not errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("task set is empty")]
    EmptyTaskSet,

    #[error("task {task}: {field} must be positive")]
    ZeroParameter { task: TaskId, field: &'static str },

    #[error("task {task} is HI-criticality but has no HI WCET")]
    MissingHiWcet { task: TaskId },

    #[error("task {task} is LO-criticality but carries a HI WCET")]
    UnexpectedHiWcet { task: TaskId },

    #[error("task {task}: HI WCET {hi} is below LO WCET {lo}")]
    HiWcetBelowLo { task: TaskId, lo: u64, hi: u64 },

    #[error("task {task}: {field} = {value} exceeds i64::MAX ticks")]
    ParameterTooLarge {
        task: TaskId,
        field: &'static str,
        value: u64,
    },

    #[error("task id {id} appears more than once")]
    DuplicateTaskId { id: TaskId },

    #[error("no LO-mode response time recorded for task {task}")]
    MissingLoResponse { task: TaskId },
}
