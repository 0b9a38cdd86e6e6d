pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::SchedCore;
pub use event::{EventKind, SimEvent, TraceEntry};
pub use state::{JobKey, ReadyQueue, SimState};
