pub mod job;
pub mod task;

pub use job::{Job, ReadyKey};
pub use task::{
    Criticality, MAX_TICKS, Priority, Task, TaskId, Ticks, priority_order, simulation_horizon,
    validate_task_set,
};
