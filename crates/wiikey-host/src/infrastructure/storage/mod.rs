//! On-disk storage: host configuration and the key mapping file.

pub mod config;
pub mod mapping_loader;
