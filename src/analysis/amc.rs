use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use super::rta::{Interference, solve};
use crate::{
    error::ConfigError,
    model::{Criticality, Task, TaskId, Ticks, priority_order, validate_task_set},
};

pub type ResponseTimes = FxHashMap<TaskId, Ticks>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    LoMode,
    HiMode,
    Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Schedulable,
    Unschedulable {
        task: TaskId,
        response: Ticks,
        deadline: Ticks,
    },
    // Skipped because an earlier pass failed
    NotRun,
}

impl Verdict {
    pub fn is_schedulable(&self) -> bool {
        matches!(self, Self::Schedulable)
    }
}

/// Result of one analysis pass. `response_times` holds a bound for every
/// task the pass covers when schedulable, and is empty otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    pub verdict: Verdict,
    pub response_times: ResponseTimes,
}

impl PassOutcome {
    fn not_run() -> Self {
        Self {
            verdict: Verdict::NotRun,
            response_times: ResponseTimes::default(),
        }
    }

    fn unschedulable(pass: Pass, task: &Task, response: Ticks) -> Self {
        warn!(
            "{:?}: task {} misses its deadline, R={} > D={}",
            pass, task.name, response, task.deadline
        );
        Self {
            verdict: Verdict::Unschedulable {
                task: task.id,
                response,
                deadline: task.deadline,
            },
            response_times: ResponseTimes::default(),
        }
    }

    fn schedulable(response_times: ResponseTimes) -> Self {
        Self {
            verdict: Verdict::Schedulable,
            response_times,
        }
    }
}

fn interference_from<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    wcet: impl Fn(&Task) -> Result<Ticks, ConfigError>,
) -> Result<Vec<Interference>, ConfigError> {
    tasks
        .into_iter()
        .map(|t| Ok(Interference::new(t.period, wcet(t)?)))
        .collect()
}

pub fn lo_mode(tasks: &[Task]) -> Result<PassOutcome, ConfigError> {
    validate_task_set(tasks)?;

    let mut response_times = ResponseTimes::default();
    for task in priority_order(tasks) {
        let hp = interference_from(
            tasks.iter().filter(|t| t.priority < task.priority),
            |t| Ok(t.wcet_lo),
        )?;
        let r_lo = solve(task.wcet_lo, &hp, task.deadline);
        if r_lo > task.deadline {
            return Ok(PassOutcome::unschedulable(Pass::LoMode, task, r_lo));
        }

        debug!("task {}: R(LO)={} D={}", task.name, r_lo, task.deadline);
        response_times.insert(task.id, r_lo);
    }

    Ok(PassOutcome::schedulable(response_times))
}

// HI tasks only, at C(HI)
pub fn hi_mode(tasks: &[Task]) -> Result<PassOutcome, ConfigError> {
    validate_task_set(tasks)?;

    let hi_tasks: Vec<&Task> = priority_order(tasks)
        .into_iter()
        .filter(|t| t.is_hi())
        .collect();

    let mut response_times = ResponseTimes::default();
    for &task in &hi_tasks {
        let hp = interference_from(
            hi_tasks
                .iter()
                .copied()
                .filter(|t| t.priority < task.priority),
            Task::hi_wcet,
        )?;
        let r_hi = solve(task.hi_wcet()?, &hp, task.deadline);
        if r_hi > task.deadline {
            return Ok(PassOutcome::unschedulable(Pass::HiMode, task, r_hi));
        }

        debug!("task {}: R(HI)={} D={}", task.name, r_hi, task.deadline);
        response_times.insert(task.id, r_hi);
    }

    Ok(PassOutcome::schedulable(response_times))
}

/// AMC-rtb bound across the LO->HI switch.
///
/// Higher-priority LO tasks contribute a fixed amount of interference,
/// capped by how many of their jobs can arrive within the task's own
/// `R(LO)`. Higher-priority HI tasks interfere dynamically at C(HI).
pub fn transition(tasks: &[Task], r_lo: &ResponseTimes) -> Result<PassOutcome, ConfigError> {
    validate_task_set(tasks)?;

    let mut response_times = ResponseTimes::default();
    for task in priority_order(tasks).into_iter().filter(|t| t.is_hi()) {
        let task_r_lo = *r_lo
            .get(&task.id)
            .ok_or(ConfigError::MissingLoResponse { task: task.id })?;

        let hp = || tasks.iter().filter(|t| t.priority < task.priority);

        let fixed_lo_interference: Ticks = hp()
            .filter(|t| t.criticality == Criticality::Lo)
            .map(|t| Interference::new(t.period, t.wcet_lo).demand(task_r_lo))
            .fold(0, Ticks::saturating_add);
        let hp_hi = interference_from(hp().filter(|t| t.is_hi()), Task::hi_wcet)?;

        let base = task.hi_wcet()?.saturating_add(fixed_lo_interference);
        let r_star = solve(base, &hp_hi, task.deadline);
        if r_star > task.deadline {
            return Ok(PassOutcome::unschedulable(Pass::Transition, task, r_star));
        }

        debug!(
            "task {}: R*={} (LO interference {}) D={}",
            task.name, r_star, fixed_lo_interference, task.deadline
        );
        response_times.insert(task.id, r_star);
    }

    Ok(PassOutcome::schedulable(response_times))
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub lo: PassOutcome,
    pub hi: PassOutcome,
    pub transition: PassOutcome,
}

impl AnalysisReport {
    pub fn is_schedulable(&self) -> bool {
        self.lo.verdict.is_schedulable()
            && self.hi.verdict.is_schedulable()
            && self.transition.verdict.is_schedulable()
    }

    pub fn r_lo(&self) -> &ResponseTimes {
        &self.lo.response_times
    }

    pub fn first_failure(&self) -> Option<(Pass, Verdict)> {
        [
            (Pass::LoMode, self.lo.verdict),
            (Pass::HiMode, self.hi.verdict),
            (Pass::Transition, self.transition.verdict),
        ]
        .into_iter()
        .find(|(_, verdict)| !verdict.is_schedulable())
    }
}

/// Run LO-mode, stable HI-mode and transition analysis in order, stopping
/// at the first pass that fails.
pub fn analyze(tasks: &[Task]) -> Result<AnalysisReport, ConfigError> {
    let lo = lo_mode(tasks)?;
    if !lo.verdict.is_schedulable() {
        info!("analysis stopped: unschedulable in LO mode");
        return Ok(AnalysisReport {
            lo,
            hi: PassOutcome::not_run(),
            transition: PassOutcome::not_run(),
        });
    }

    let hi = hi_mode(tasks)?;
    if !hi.verdict.is_schedulable() {
        info!("analysis stopped: unschedulable in stable HI mode");
        return Ok(AnalysisReport {
            lo,
            hi,
            transition: PassOutcome::not_run(),
        });
    }

    let transition = transition(tasks, &lo.response_times)?;
    if transition.verdict.is_schedulable() {
        info!("task set is schedulable under AMC-rtb");
    } else {
        info!("analysis stopped: unschedulable during LO->HI transition");
    }

    Ok(AnalysisReport { lo, hi, transition })
}
