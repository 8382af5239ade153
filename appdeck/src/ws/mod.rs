//! Hand-built WebSocket client: frame codec, upgrade handshake, log session

pub mod frame;
pub mod handshake;
pub mod session;
