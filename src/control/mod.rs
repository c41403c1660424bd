pub mod controller;
pub mod protocol;
pub mod worker;

pub use self::controller::RunController;
pub use self::protocol::{Command, Event, GenerationSummary, RunSnapshot, RunStatus};
pub use self::worker::{spawn, RunHandle};
