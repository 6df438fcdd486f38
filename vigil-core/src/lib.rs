pub mod config;
pub mod error;
pub mod model;

pub use config::MonitorConfig;
pub use error::VigilError;
pub use model::{
    AlertPayload, ErrorAnalysis, ErrorEvent, LogEntry, LogLevel, PerformanceAnalysis,
    PerformanceSample, Report, UpstreamHealth, UpstreamStatus,
};
