pub mod history;
pub mod registry;
pub mod service;

pub use history::HistoryStore;
pub use registry::{ActiveMonitor, MonitorRegistry};
pub use service::{MonitoringStarted, QuoteMonitor};
