//! # roombus-egress
//!
//! Egress Supervisor (§4.4): owns encoder child processes that read bus
//! producers over plain RTP and push them out to Icecast/SRT/file
//! destinations. Depends on `roombus-sfu` (plain transports) and
//! `roombus-db` (AudioOutput persistence); knows nothing about the bus's
//! room-channel naming.

pub mod args;
pub mod error;
pub mod event;
pub mod supervisor;

pub use error::EgressError;
pub use event::{EgressEvent, EncoderState};
pub use supervisor::{EgressStats, EncoderSupervisor};
