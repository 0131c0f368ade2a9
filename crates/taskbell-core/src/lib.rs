pub mod clock;
pub mod error;
pub mod task;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::TimeParseError;
pub use task::{CompleteOutcome, CreateTask, Task, TaskFilter, TaskOrder};
