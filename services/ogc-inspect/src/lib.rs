//! Library half of the `ogc-inspect` CLI.

pub mod commands;
pub mod config;
pub mod report;

pub use config::InspectConfig;
