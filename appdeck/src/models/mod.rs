//! Data models

pub mod app;
pub mod log_entry;
