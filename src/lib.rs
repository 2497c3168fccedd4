pub mod config;
pub mod error;
pub mod job;
pub mod runner;
pub mod server;
