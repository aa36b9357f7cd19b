//! # roombus-ingest
//!
//! Ingest Supervisor (§4.5): symmetric to `roombus-egress` but on the other
//! side of the pipe — brings SRT/RIST/WHIP sources into a room as SFU
//! producers. Depends on `roombus-sfu` (producer-side plain transports and,
//! for WHIP, a real WebRTC send transport) and `roombus-db` (AudioSource and
//! WhipStream persistence).

pub mod args;
pub mod error;
pub mod event;
pub mod port_pool;
pub mod supervisor;
pub mod whip;

pub use error::IngestError;
pub use event::IngestEvent;
pub use supervisor::{IngestStats, IngestSupervisor};
pub use whip::WhipSupervisor;
