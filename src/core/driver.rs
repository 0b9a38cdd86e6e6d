use log::{debug, trace, warn};

use super::{
    event::{EventKind, SimEvent, TraceEntry},
    observer::Observer,
    state::{JobKey, SimState},
};
use crate::{
    model::{Criticality, Job, Ticks},
    scheduler::{DispatchDecision, Scenario, SystemMode, dispatch},
    sim::job::CompletedJob,
};

#[derive(Debug)]
pub struct SchedCore<'a> {
    pub state: SimState<'a>,
    pub log: Vec<SimEvent>,
    pub trace: Vec<TraceEntry>,
    pub evicted: usize,
    observer: Observer,
}

impl<'a> SchedCore<'a> {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            state: SimState::new(scenario),
            log: Vec::new(),
            trace: Vec::new(),
            evicted: 0,
            observer: Observer::new(),
        }
    }

    pub fn emit(&mut self, kind: EventKind, detail: impl Into<String>) {
        let tick = self.state.now;
        self.emit_at(tick, kind, detail);
    }

    pub fn emit_at(&mut self, tick: Ticks, kind: EventKind, detail: impl Into<String>) {
        let event = SimEvent {
            tick,
            kind,
            detail: detail.into(),
            mode: self.state.mode,
            running: self.state.running_name(),
        };
        debug!("{event}");
        self.log.push(event);
    }

    pub fn release(&mut self, job: Job<'a>) -> JobKey {
        let detail = format!(
            "{}, Prio: {}, WCET: {}",
            job.name(),
            job.priority(),
            job.remaining_execution
        );
        let key = self.state.ready.push(job);
        self.emit(EventKind::JobReleased, detail);
        key
    }

    // Return the finished job if the running job completed in this tick
    pub fn tick(&mut self) -> Option<CompletedJob> {
        self.schedule();

        let executed = self.execute();
        let completed = executed.and_then(|key| self.complete(key));

        self.observer.observe(&self.state);
        self.state.advance_time(1);
        completed
    }

    fn schedule(&mut self) {
        if self.state.mode == SystemMode::Hi && self.state.ready.any_with(Criticality::Lo) {
            self.evict_lo_jobs();
        }

        let decision = dispatch(self.state.running_entry(), self.state.ready.peek());
        match decision {
            DispatchDecision::Idle { stopped } => {
                self.state.running = None;
                if stopped.is_some() || !self.state.was_idle {
                    self.emit(EventKind::CpuIdle, "CPU is now idle");
                }
                self.state.was_idle = true;
            }
            DispatchDecision::Start(key) => {
                self.state.running = Some(key);
                self.state.was_idle = false;
                let name = self.job_name(key);
                self.emit(EventKind::ExecutionStarted, format!("Execution started: {name}"));
            }
            DispatchDecision::Preempt { from, to } => {
                let (from, to_name) = (self.job_name(from), self.job_name(to));
                self.state.running = Some(to);
                self.emit(
                    EventKind::Preemption,
                    format!("{to_name} preempts {from}"),
                );
            }
            DispatchDecision::Continue => {}
        }
    }

    fn evict_lo_jobs(&mut self) {
        let evicted = self.state.ready.evict(Criticality::Lo);
        if self
            .state
            .running
            .is_some_and(|running| !self.state.ready.contains(running))
        {
            self.state.running = None;
        }

        self.evicted += evicted.len();
        let names: Vec<String> = evicted.iter().map(Job::name).collect();
        self.emit(
            EventKind::JobsEvicted,
            format!("Dropped LO-criticality jobs: {}", names.join(", ")),
        );
    }

    // Overrunning C(LO) in LO mode switches to HI and reschedules at once
    fn execute(&mut self) -> Option<JobKey> {
        let Some(key) = self.state.running else {
            trace!("t={} idle", self.state.now);
            self.trace.push(TraceEntry {
                tick: self.state.now,
                task: None,
                criticality: None,
            });
            return None;
        };

        let job = self
            .state
            .ready
            .get_mut(key)
            .expect("Running job missing from ready set");
        job.execute();
        let overran = job.overran_lo_budget();

        trace!("t={} running {}", self.state.now, job.name());
        self.trace.push(TraceEntry {
            tick: self.state.now,
            task: Some(job.task.name.clone()),
            criticality: Some(job.criticality()),
        });

        if self.state.mode == SystemMode::Lo && overran {
            let name = self.job_name(key);
            self.state.enter_hi_mode();
            self.emit(
                EventKind::ModeSwitch,
                format!("Criticality switch: {name} exceeded its C(LO) budget"),
            );
            self.schedule();
        }

        Some(key)
    }

    fn complete(&mut self, key: JobKey) -> Option<CompletedJob> {
        if !self.state.ready.get(key)?.is_complete() {
            return None;
        }

        let finish = self.state.now + 1;
        let name = self.job_name(key);
        self.emit_at(finish, EventKind::JobFinished, format!("Job finished: {name}"));

        let job = self.state.ready.remove(key)?;
        if self.state.running == Some(key) {
            self.state.running = None;
        }

        let done = CompletedJob::new(&job, finish);
        if done.deadline_missed {
            warn!(
                "t={finish} {} missed its deadline {}",
                done.name, done.absolute_deadline
            );
            self.emit_at(
                finish,
                EventKind::DeadlineMiss,
                format!("Deadline miss: {} (deadline {})", done.name, done.absolute_deadline),
            );
        }
        Some(done)
    }

    fn job_name(&self, key: JobKey) -> String {
        self.state
            .ready
            .get(key)
            .map(Job::name)
            .unwrap_or_else(|| format!("{key:?}"))
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}
