pub mod driver;
pub mod job;

pub use driver::{Sim, SimReport};
pub use job::CompletedJob;
