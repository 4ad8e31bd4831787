pub mod config;
pub mod snippet;
