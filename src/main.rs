use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use amc_sim::{
    Criticality, Scenario, Sim, SimReport, Task, analyze,
    analysis::Verdict,
    model::{Ticks, simulation_horizon},
};
use anyhow::{Context, Result, bail};
use average::Estimate;
use clap::Parser;
use log::{info, warn};
use rand::prelude::*;

/// Analyze and simulate an AMC-rtb task set synthesized from WCET measurements.
#[derive(Debug, Parser)]
struct Opts {
    /// Analyze a saved JSON task set instead of synthesizing one. Priorities
    /// are taken from the file as is.
    #[clap(long, conflicts_with = "wcet_file")]
    task_set: Option<PathBuf>,

    /// Write the task set to this JSON file before analyzing it.
    #[clap(long)]
    save_task_set: Option<PathBuf>,

    /// JSON file mapping benchmark name to measured worst-case cycles. A
    /// small built-in table is used when omitted.
    #[clap(short = 'w', long)]
    wcet_file: Option<PathBuf>,

    /// Divide measured cycles by this factor (rounding up) to get ticks.
    #[clap(long, default_value = "1")]
    scale: u64,

    /// Seed for criticality, period and C(HI) draws.
    #[clap(short = 's', long, default_value = "0")]
    seed: u64,

    /// Probability that a task is HI-criticality.
    #[clap(long, default_value = "0.4")]
    hi_prob: f64,

    /// Period as a multiple of C(LO): lower and upper bound.
    #[clap(long, num_args = 2, default_values_t = [10.0, 20.0])]
    period_factor: Vec<f64>,

    /// C(HI) as a multiple of C(LO): lower and upper bound.
    #[clap(long, num_args = 2, default_values_t = [1.5, 2.0])]
    hi_factor: Vec<f64>,

    /// Simulated ticks per scenario. Defaults to twice the longest period.
    #[clap(short = 'd', long)]
    duration: Option<Ticks>,

    /// Print the per-tick execution trace.
    #[clap(short = 't', long)]
    trace: bool,

    /// Enable verbose output, including the scheduling event log. Specify
    /// multiple times to increase verbosity.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const BUILTIN_WCETS: [(&str, u64); 3] = [("basicmath", 12), ("qsort", 7), ("crc", 3)];

fn load_wcets(opts: &Opts) -> Result<BTreeMap<String, u64>> {
    let raw = match &opts.wcet_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<BTreeMap<String, u64>>(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => BUILTIN_WCETS
            .iter()
            .map(|(name, wcet)| (name.to_string(), *wcet))
            .collect(),
    };

    if opts.scale == 0 {
        bail!("--scale must be positive");
    }
    Ok(raw
        .into_iter()
        .map(|(name, cycles)| (name, cycles.div_ceil(opts.scale)))
        .collect())
}

fn load_task_set(path: &Path) -> Result<Vec<Task>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn save_task_set(tasks: &[Task], path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(tasks)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} tasks to {}", tasks.len(), path.display());
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// Deadline-Monotonic, implicit deadlines
fn synthesize(wcets: &BTreeMap<String, u64>, opts: &Opts, rng: &mut StdRng) -> Vec<Task> {
    let (period_lo, period_hi) = (opts.period_factor[0], opts.period_factor[1]);
    let (c_hi_lo, c_hi_hi) = (opts.hi_factor[0], opts.hi_factor[1]);

    let mut benchmarks: Vec<(&String, &u64)> = wcets.iter().collect();
    benchmarks.sort_by_key(|(_, wcet)| **wcet);

    let mut tasks = Vec::new();
    for (i, (name, &wcet_lo)) in benchmarks.into_iter().enumerate() {
        if wcet_lo == 0 {
            warn!("Skipping {name}: zero WCET");
            continue;
        }

        let id = i as u64 + 1;
        let period = (wcet_lo as f64 * rng.random_range(period_lo..=period_hi)) as Ticks;
        let task = if rng.random::<f64>() < opts.hi_prob {
            let wcet_hi = (wcet_lo as f64 * rng.random_range(c_hi_lo..=c_hi_hi)) as Ticks;
            Task::new_hi(id, capitalize(name), period, wcet_lo, wcet_hi, 0)
        } else {
            Task::new_lo(id, capitalize(name), period, wcet_lo, 0)
        };
        tasks.push(task);
    }

    tasks.sort_by_key(|t| t.deadline);
    for (priority, task) in tasks.iter_mut().enumerate() {
        task.priority = priority as u32 + 1;
    }

    let utilization: f64 = tasks.iter().map(Task::utilization).sum();
    info!("Total LO-mode utilization: {:.2}%", utilization * 100.0);
    if utilization > 1.0 {
        warn!("LO-mode utilization exceeds 100%; the task set is likely unschedulable");
    }
    tasks
}

fn print_task_set(tasks: &[Task]) {
    println!(
        "{:>3} {:<12} {:>4} {:>8} {:>8} {:>6} {:>6}",
        "ID", "Name", "Crit", "Period", "Deadline", "C(LO)", "C(HI)"
    );
    for t in tasks {
        let wcet_hi = t
            .wcet_hi
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3} {:<12} {:>4} {:>8} {:>8} {:>6} {:>6}  prio {}",
            t.id, t.name, t.criticality, t.period, t.deadline, t.wcet_lo, wcet_hi, t.priority
        );
    }
}

fn describe(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Schedulable => "schedulable".to_string(),
        Verdict::Unschedulable {
            task,
            response,
            deadline,
        } => format!("UNSCHEDULABLE (task {task}: R={response} > D={deadline})"),
        Verdict::NotRun => "not run".to_string(),
    }
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<average::Mean>().estimate()
}

fn print_report(tasks: &[Task], report: &SimReport, opts: &Opts) {
    println!(
        "\n--- {} scenario ({} ticks) ---",
        report.scenario, report.duration
    );

    if opts.verbose > 0 {
        for event in &report.events {
            println!("{event}");
        }
    }

    if opts.trace {
        for entry in &report.trace {
            println!(
                "{:>6} {:<12} {}",
                entry.tick,
                entry.task_label(),
                entry.criticality_label()
            );
        }
    }

    for task in tasks {
        let responses = report
            .completed
            .iter()
            .filter(|j| j.task == task.id)
            .map(|j| j.response_time as f64);
        let finished = report.completed.iter().filter(|j| j.task == task.id).count();
        if finished == 0 {
            println!("{:<12} no completed jobs", task.name);
            continue;
        }
        println!(
            "{:<12} {:>3} jobs, average response time {:.2} ticks",
            task.name,
            finished,
            avg(responses)
        );
    }

    match report.mode_switch_at {
        Some(tick) => println!(
            "Mode switch at tick {tick}; {} LO job(s) dropped",
            report.evicted
        ),
        None => println!("No mode switch"),
    }
    println!(
        "CPU busy {} of {} ticks; {} deadline miss(es)",
        report.busy_ticks(),
        report.duration,
        report.deadline_misses().count()
    );
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let llv = match opts.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Off)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    for (flag, range) in [("period-factor", &opts.period_factor), ("hi-factor", &opts.hi_factor)] {
        if range[0] <= 0.0 || range[0] > range[1] {
            bail!("--{flag} needs 0 < MIN <= MAX, got {} {}", range[0], range[1]);
        }
    }
    if opts.hi_factor[0] < 1.0 {
        bail!("--hi-factor must not shrink C(HI) below C(LO)");
    }

    let tasks = match &opts.task_set {
        Some(path) => load_task_set(path)?,
        None => {
            let wcets = load_wcets(&opts)?;
            let mut rng = StdRng::seed_from_u64(opts.seed);
            synthesize(&wcets, &opts, &mut rng)
        }
    };
    if tasks.is_empty() {
        bail!("Task set is empty");
    }
    if let Some(path) = &opts.save_task_set {
        save_task_set(&tasks, path)?;
    }
    print_task_set(&tasks);

    let analysis = analyze(&tasks).context("Malformed task set")?;
    println!("\nLO mode:    {}", describe(&analysis.lo.verdict));
    println!("HI mode:    {}", describe(&analysis.hi.verdict));
    println!("Transition: {}", describe(&analysis.transition.verdict));
    for task in &tasks {
        if let Some(r_lo) = analysis.r_lo().get(&task.id) {
            let r_star = analysis.transition.response_times.get(&task.id);
            match (task.criticality, r_star) {
                (Criticality::Hi, Some(r_star)) => {
                    println!("  {:<12} R(LO)={r_lo} R*={r_star}", task.name)
                }
                _ => println!("  {:<12} R(LO)={r_lo}", task.name),
            }
        }
    }

    if !analysis.is_schedulable() {
        println!("\nTask set is not schedulable under AMC-rtb; skipping simulation.");
        return Ok(());
    }

    let duration = opts.duration.unwrap_or_else(|| simulation_horizon(&tasks));
    for scenario in [Scenario::LoMode, Scenario::HiMode] {
        let report = Sim::new(&tasks, scenario)
            .context("Malformed task set")?
            .run(duration);
        print_report(&tasks, &report, &opts);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_task_set_replaces_synthesis() {
        let opts = Opts::parse_from(["amc-sim", "--seed", "7"]);
        let wcets = load_wcets(&opts).unwrap();
        let tasks = synthesize(&wcets, &opts, &mut StdRng::seed_from_u64(opts.seed));

        let path = std::env::temp_dir().join(format!("amc-sim-{}.json", std::process::id()));
        save_task_set(&tasks, &path).unwrap();
        let loaded = load_task_set(&path);
        fs::remove_file(&path).unwrap();

        let loaded = loaded.unwrap();
        assert_eq!(loaded, tasks);
        assert_eq!(analyze(&loaded).unwrap(), analyze(&tasks).unwrap());
    }

    #[test]
    fn task_set_option_conflicts_with_wcet_file() {
        assert!(Opts::try_parse_from(["amc-sim", "--task-set", "a.json"]).is_ok());
        assert!(
            Opts::try_parse_from(["amc-sim", "--task-set", "a.json", "-w", "w.json"]).is_err()
        );
    }

    #[test]
    fn unreadable_task_set_is_an_error() {
        let err = load_task_set(Path::new("/nonexistent/task_set.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
