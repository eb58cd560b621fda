pub mod fleet;
pub mod history;
pub mod report_diff;
pub mod report_engine;
