use crate::model::{Criticality, Job, TaskId, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub name: String,
    pub task: TaskId,
    pub criticality: Criticality,
    pub arrival_time: Ticks,
    pub finish_time: Ticks,
    pub absolute_deadline: Ticks,
    pub response_time: Ticks,
    pub deadline_missed: bool,
}

impl CompletedJob {
    pub fn new(job: &Job<'_>, finish_time: Ticks) -> Self {
        Self {
            name: job.name(),
            task: job.task.id,
            criticality: job.criticality(),
            arrival_time: job.arrival_time,
            finish_time,
            absolute_deadline: job.absolute_deadline,
            response_time: finish_time - job.arrival_time,
            deadline_missed: finish_time > job.absolute_deadline,
        }
    }
}
