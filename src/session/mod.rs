//! Live session: transport traits and the loop that drives a connection.

pub mod live;
pub mod runner;

pub use live::{LiveConnector, LiveReceiver, LiveSender, RealtimeInput, ServerEvent};
pub use runner::{SessionHandle, SessionLoop, forward_confirmation_requests};
