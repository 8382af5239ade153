//! Deployment submission and transition polling

pub mod poller;
