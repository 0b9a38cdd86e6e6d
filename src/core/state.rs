use keyed_priority_queue::KeyedPriorityQueue;
use slotmap::{SlotMap, new_key_type};

use crate::{
    model::{Criticality, Job, ReadyKey, Ticks},
    scheduler::{Scenario, SystemMode},
};

new_key_type! {
    pub struct JobKey;
}

/// Released, unfinished jobs. Job data lives in a slot map; the priority
/// queue only orders keys by the immutable [`ReadyKey`] captured at release.
#[derive(Debug)]
pub struct ReadyQueue<'a> {
    jobs: SlotMap<JobKey, Job<'a>>,
    queue: KeyedPriorityQueue<JobKey, ReadyKey>,
}

impl<'a> ReadyQueue<'a> {
    pub fn new() -> Self {
        Self {
            jobs: SlotMap::with_key(),
            queue: KeyedPriorityQueue::new(),
        }
    }

    pub fn push(&mut self, job: Job<'a>) -> JobKey {
        let ready_key = job.key();
        let key = self.jobs.insert(job);
        self.queue.push(key, ready_key);
        key
    }

    pub fn peek(&self) -> Option<(JobKey, ReadyKey)> {
        self.queue.peek().map(|(key, ready_key)| (*key, *ready_key))
    }

    pub fn remove(&mut self, key: JobKey) -> Option<Job<'a>> {
        let removed = self.queue.remove(&key);
        debug_assert!(removed.is_some(), "Job {key:?} missing from ready queue");
        self.jobs.remove(key)
    }

    /// Remove every job of the given criticality, highest priority first.
    pub fn evict(&mut self, criticality: Criticality) -> Vec<Job<'a>> {
        let mut doomed: Vec<(JobKey, ReadyKey)> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.criticality() == criticality)
            .map(|(key, job)| (key, job.key()))
            .collect();
        doomed.sort_by(|a, b| b.1.cmp(&a.1));

        doomed
            .into_iter()
            .filter_map(|(key, _)| self.remove(key))
            .collect()
    }

    pub fn any_with(&self, criticality: Criticality) -> bool {
        self.jobs.values().any(|job| job.criticality() == criticality)
    }

    pub fn get(&self, key: JobKey) -> Option<&Job<'a>> {
        self.jobs.get(key)
    }

    pub fn get_mut(&mut self, key: JobKey) -> Option<&mut Job<'a>> {
        self.jobs.get_mut(key)
    }

    pub fn contains(&self, key: JobKey) -> bool {
        self.jobs.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobKey, &Job<'a>)> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, key: JobKey) -> bool {
        self.queue.get_priority(&key).is_some()
    }
}

impl Default for ReadyQueue<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct SimState<'a> {
    pub now: Ticks,
    pub scenario: Scenario,
    pub mode: SystemMode,
    pub ready: ReadyQueue<'a>,
    pub running: Option<JobKey>,
    pub mode_switch_at: Option<Ticks>,
    // Whether the processor was idle at the end of the previous tick
    pub was_idle: bool,
}

impl<'a> SimState<'a> {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            now: 0,
            scenario,
            mode: SystemMode::Lo,
            ready: ReadyQueue::new(),
            running: None,
            mode_switch_at: None,
            was_idle: false,
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn running_job(&self) -> Option<&Job<'a>> {
        self.running.and_then(|key| self.ready.get(key))
    }

    pub fn running_entry(&self) -> Option<(JobKey, ReadyKey)> {
        self.running
            .and_then(|key| self.ready.get(key).map(|job| (key, job.key())))
    }

    pub fn running_name(&self) -> String {
        self.running_job()
            .map(Job::name)
            .unwrap_or_else(|| "Idle".to_string())
    }

    pub fn enter_hi_mode(&mut self) -> bool {
        if self.mode == SystemMode::Hi {
            return false;
        }
        self.mode = SystemMode::Hi;
        self.mode_switch_at = Some(self.now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    #[test]
    fn peek_returns_highest_priority() {
        let t1 = Task::new_lo(1, "A", 10, 1, 2);
        let t2 = Task::new_lo(2, "B", 10, 1, 1);
        let mut ready = ReadyQueue::new();

        let a = ready.push(Job::new(&t1, 0, 1));
        let b = ready.push(Job::new(&t2, 0, 1));
        assert_eq!(ready.peek().map(|(k, _)| k), Some(b));

        ready.remove(b);
        assert_eq!(ready.peek().map(|(k, _)| k), Some(a));
        assert_eq!(ready.len(), 1);
        assert_eq!(ready.queued_len(), 1);
    }

    #[test]
    fn same_task_jobs_serve_oldest_first() {
        let t = Task::new_lo(1, "A", 10, 1, 1);
        let mut ready = ReadyQueue::new();

        let late = ready.push(Job::new(&t, 10, 1));
        let early = ready.push(Job::new(&t, 0, 1));
        assert_eq!(ready.peek().map(|(k, _)| k), Some(early));
        ready.remove(early);
        assert_eq!(ready.peek().map(|(k, _)| k), Some(late));
    }

    #[test]
    fn evict_drops_only_matching_criticality() {
        let lo = Task::new_lo(1, "L", 10, 1, 1);
        let hi = Task::new_hi(2, "H", 10, 1, 2, 2);
        let mut ready = ReadyQueue::new();

        ready.push(Job::new(&lo, 0, 1));
        let h = ready.push(Job::new(&hi, 0, 1));
        ready.push(Job::new(&lo, 10, 1));

        let evicted = ready.evict(Criticality::Lo);
        assert_eq!(evicted.len(), 2);
        assert_eq!(evicted[0].arrival_time, 0);
        assert!(!ready.any_with(Criticality::Lo));
        assert_eq!(ready.peek().map(|(k, _)| k), Some(h));
        assert!(ready.is_queued(h));
    }

    #[test]
    fn hi_mode_is_entered_once() {
        let mut state = SimState::new(Scenario::HiMode);
        state.now = 7;
        assert!(state.enter_hi_mode());
        state.now = 9;
        assert!(!state.enter_hi_mode());
        assert_eq!(state.mode_switch_at, Some(7));
        assert_eq!(state.running_name(), "Idle");
    }
}
