//! Core domain models shared across every room bus crate.
//!
//! These are the "truth" types — what the database stores and what the bus
//! serializes onto the wire. Every model uses Snowflake-style (UUIDv7) ids
//! for globally unique, time-sortable identifiers (see [`crate::snowflake`]).

pub mod audio_output;
pub mod audio_source;
pub mod chat;
pub mod cue;
pub mod ifb;
pub mod mix_state;
pub mod participant;
pub mod recording;
pub mod room;
pub mod rundown;
pub mod talkback;
pub mod timer;
pub mod whip;

pub use audio_output::*;
pub use audio_source::*;
pub use chat::*;
pub use cue::*;
pub use ifb::*;
pub use mix_state::*;
pub use participant::*;
pub use recording::*;
pub use room::*;
pub use rundown::*;
pub use talkback::*;
pub use timer::*;
pub use whip::*;
