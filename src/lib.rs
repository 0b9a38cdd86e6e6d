//! Mixed-criticality fixed-priority scheduling under AMC-rtb.
//!
//! [`analysis`] proves schedulability in LO mode, stable HI mode and across
//! the LO->HI switch. [`sim`] replays the same policy tick by tick and
//! records an event log and execution trace. Both consume the same
//! priority-assigned [`Task`] list and are independent of each other.

pub mod analysis;
pub mod core;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod sim;

pub use analysis::{AnalysisReport, Verdict, analyze};
pub use error::ConfigError;
pub use model::{Criticality, Task};
pub use scheduler::{Scenario, SystemMode};
pub use sim::{Sim, SimReport};
