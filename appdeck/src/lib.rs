//! Appdeck Library
//!
//! App lifecycle management for a managed compute platform, plus a
//! hand-built WebSocket client for streaming logs directly from the
//! running app instance.

pub mod apps;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod utils;
pub mod ws;
