pub mod capture;
pub mod config;
pub mod engine;
pub mod executor;
pub mod procfs;
pub mod report;
pub mod solutions;
