use log::info;

use super::job::CompletedJob;
use crate::{
    core::{
        driver::SchedCore,
        event::{EventKind, SimEvent, TraceEntry},
    },
    error::ConfigError,
    model::{Job, Task, Ticks, validate_task_set},
    scheduler::{Scenario, SystemMode},
};

pub struct Sim<'a> {
    pub core: SchedCore<'a>,
    pub jobs: Vec<CompletedJob>,
    tasks: &'a [Task],
    scenario: Scenario,
}

impl<'a> Sim<'a> {
    pub fn new(tasks: &'a [Task], scenario: Scenario) -> Result<Self, ConfigError> {
        validate_task_set(tasks)?;
        Ok(Self {
            core: SchedCore::new(scenario),
            jobs: Vec::new(),
            tasks,
            scenario,
        })
    }

    pub fn step(&mut self) {
        self.handle_releases();
        if let Some(done) = self.core.tick() {
            self.jobs.push(done);
        }
    }

    fn handle_releases(&mut self) {
        let now = self.core.state.now;
        let tasks: &'a [Task] = self.tasks;
        for task in tasks.iter().filter(|t| now % t.period == 0) {
            let job = Job::new(task, now, task.budget(self.scenario));
            self.core.release(job);
        }
    }

    /// Simulate ticks `0..max_time`. Work still pending at the end is abandoned.
    pub fn run(mut self, max_time: Ticks) -> SimReport {
        self.core.emit(
            EventKind::SimulationStart,
            format!(
                "Simulation started: Scenario={}, Duration={}",
                self.scenario, max_time
            ),
        );

        while self.now() < max_time {
            self.step();
        }

        self.core
            .emit(EventKind::SimulationEnd, "Simulation finished");

        let report = SimReport {
            scenario: self.scenario,
            duration: max_time,
            final_mode: self.core.state.mode,
            mode_switch_at: self.core.state.mode_switch_at,
            evicted: self.core.evicted,
            events: self.core.log,
            trace: self.core.trace,
            completed: self.jobs,
        };
        info!(
            "{} run over {} ticks: {} jobs finished, {} deadline misses, {} evicted",
            report.scenario,
            report.duration,
            report.completed.len(),
            report.deadline_misses().count(),
            report.evicted
        );
        report
    }

    pub fn now(&self) -> Ticks {
        self.core.state.now
    }

    pub fn mode(&self) -> SystemMode {
        self.core.state.mode
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }
}

#[derive(Debug, Clone)]
pub struct SimReport {
    pub scenario: Scenario,
    pub duration: Ticks,
    pub final_mode: SystemMode,
    pub mode_switch_at: Option<Ticks>,
    pub evicted: usize,
    pub events: Vec<SimEvent>,
    pub trace: Vec<TraceEntry>,
    pub completed: Vec<CompletedJob>,
}

impl SimReport {
    pub fn deadline_misses(&self) -> impl Iterator<Item = &CompletedJob> {
        self.completed.iter().filter(|job| job.deadline_missed)
    }

    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &SimEvent> {
        self.events.iter().filter(move |event| event.kind == kind)
    }

    pub fn busy_ticks(&self) -> usize {
        self.trace.iter().filter(|entry| !entry.is_idle()).count()
    }
}
