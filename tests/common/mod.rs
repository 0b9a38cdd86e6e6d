#![allow(dead_code)]

use amc_sim::Task;
use proptest::prelude::*;

/// Deadline-Monotonic task set from (wcet_lo, slack, is_hi, hi_extra) tuples.
pub fn build_task_set(specs: Vec<(u64, u64, bool, u64)>) -> Vec<Task> {
    let mut tasks: Vec<Task> = specs
        .into_iter()
        .enumerate()
        .map(|(i, (wcet_lo, slack, is_hi, hi_extra))| {
            let id = i as u64 + 1;
            let period = wcet_lo + hi_extra + slack;
            if is_hi {
                Task::new_hi(id, format!("T{id}"), period, wcet_lo, wcet_lo + hi_extra, 0)
            } else {
                Task::new_lo(id, format!("T{id}"), period, wcet_lo, 0)
            }
        })
        .collect();
    tasks.sort_by_key(|t| (t.deadline, t.id));
    for (prio, task) in tasks.iter_mut().enumerate() {
        task.priority = prio as u32 + 1;
    }
    tasks
}

pub fn task_sets() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((1u64..=6, 0u64..=40, any::<bool>(), 0u64..=6), 1..=6)
        .prop_map(build_task_set)
}

pub fn mixed_set() -> Vec<Task> {
    vec![
        Task::new_hi(1, "Sensor", 10, 1, 2, 1),
        Task::new_lo(2, "Logger", 20, 3, 2),
        Task::new_hi(3, "Control", 40, 5, 9, 3),
    ]
}
