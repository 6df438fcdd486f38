pub mod analyzer;
pub mod checks;
pub mod context;
pub mod report;
pub mod scheduler;
pub mod state;
pub mod tracker;

pub use context::MonitorContext;
pub use scheduler::Monitor;
pub use state::MonitorState;
