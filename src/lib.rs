pub mod config;
pub mod filter;
pub mod format;
pub mod history;
pub mod model;
pub mod report;
pub mod stats;
