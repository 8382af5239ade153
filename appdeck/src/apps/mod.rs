//! App lifecycle orchestration

pub mod health;
pub mod logs;
pub mod manager;
pub mod tracker;
