use std::cmp::Ordering;

use super::task::{Criticality, Priority, Task, TaskId, Ticks};

// Fixed at release. `KeyedPriorityQueue` is a max-heap, so `Ord` is flipped:
// priority number, then arrival, then task id, smallest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadyKey {
    pub priority: Priority,
    pub arrival: Ticks,
    pub task: TaskId,
}

impl PartialOrd for ReadyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.arrival.cmp(&self.arrival))
            .then_with(|| other.task.cmp(&self.task))
    }
}

#[derive(Debug, Clone)]
pub struct Job<'a> {
    pub task: &'a Task,
    pub arrival_time: Ticks,
    pub absolute_deadline: Ticks,
    pub remaining_execution: Ticks,
    // Signed: overrunning C(LO) drives this below zero
    pub lo_budget_remaining: i64,
    key: ReadyKey,
}

impl<'a> Job<'a> {
    pub fn new(task: &'a Task, arrival_time: Ticks, budget: Ticks) -> Self {
        Self {
            task,
            arrival_time,
            absolute_deadline: arrival_time.saturating_add(task.deadline),
            remaining_execution: budget,
            lo_budget_remaining: i64::try_from(task.wcet_lo).unwrap_or(i64::MAX),
            key: ReadyKey {
                priority: task.priority,
                arrival: arrival_time,
                task: task.id,
            },
        }
    }

    pub fn key(&self) -> ReadyKey {
        self.key
    }

    pub fn priority(&self) -> Priority {
        self.key.priority
    }

    pub fn criticality(&self) -> Criticality {
        self.task.criticality
    }

    pub fn name(&self) -> String {
        format!("{}_Job@{}", self.task.name, self.arrival_time)
    }

    pub fn execute(&mut self) {
        self.remaining_execution = self.remaining_execution.saturating_sub(1);
        self.lo_budget_remaining = self.lo_budget_remaining.saturating_sub(1);
    }

    pub fn overran_lo_budget(&self) -> bool {
        self.lo_budget_remaining < 0
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_execution == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_priority_key_compares_greater() {
        let hi = ReadyKey {
            priority: 1,
            arrival: 10,
            task: 7,
        };
        let lo = ReadyKey {
            priority: 2,
            arrival: 0,
            task: 1,
        };
        assert!(hi > lo);
    }

    #[test]
    fn ties_break_on_arrival_then_task_id() {
        let early = ReadyKey {
            priority: 1,
            arrival: 0,
            task: 9,
        };
        let late = ReadyKey {
            priority: 1,
            arrival: 5,
            task: 1,
        };
        assert!(early > late);

        let low_id = ReadyKey {
            priority: 1,
            arrival: 5,
            task: 1,
        };
        let high_id = ReadyKey {
            priority: 1,
            arrival: 5,
            task: 2,
        };
        assert!(low_id > high_id);
    }

    #[test]
    fn job_tracks_both_budgets() {
        let task = Task::new_hi(1, "Ctrl", 10, 2, 4, 1);
        let mut job = Job::new(&task, 20, 4);

        assert_eq!(job.absolute_deadline, 30);
        assert_eq!(job.name(), "Ctrl_Job@20");

        for _ in 0..3 {
            job.execute();
        }
        assert_eq!(job.remaining_execution, 1);
        assert_eq!(job.lo_budget_remaining, -1);
        assert!(job.overran_lo_budget());
        assert!(!job.is_complete());

        job.execute();
        assert!(job.is_complete());
    }
}
