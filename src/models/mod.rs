pub mod catalog;
pub mod personnel;
pub mod project;
pub mod report;
pub mod report_modification;
pub mod role;
pub mod user;
pub mod vehicle;
