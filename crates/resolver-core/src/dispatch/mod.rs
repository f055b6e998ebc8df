//! Bounded concurrent dispatch and load-aware admission control.

mod high_load;
mod pool;


pub use high_load::HighLoadDetector;
pub use pool::{SolveHandle, SolveOutcome, SolvePool};
