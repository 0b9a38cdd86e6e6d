//! Fixed-priority response-time analysis under AMC-rtb.

pub mod amc;
pub mod rta;

pub use amc::{
    AnalysisReport, Pass, PassOutcome, ResponseTimes, Verdict, analyze, hi_mode, lo_mode,
    transition,
};
pub use rta::{Interference, solve};
