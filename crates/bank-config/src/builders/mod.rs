//! Builders for test configurations.

pub mod config;

pub use config::{ConfigBuilder, DEV_PRIVATE_KEY};
