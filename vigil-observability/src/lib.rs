pub mod logger;
pub mod rotating_log;

pub use logger::MonitorLogger;
pub use rotating_log::{RotatingLog, RotatingLogConfig};
