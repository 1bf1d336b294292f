pub mod charts;
pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod report;
pub mod scan;
pub mod table;

pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use keys::{Epsilon, RunKey};
pub use scan::{HittingSetLogs, Iteration, ScanData, WspdLogs, scan_directory};
pub use table::{Table, depth_tables};
