//! Bus event handlers (§4.2), one module per event class from the table in
//! §4.2. `lib.rs` owns the dispatch table that routes a `ClientEnvelope` to
//! the right function here.

pub mod chat;
pub mod cues;
pub mod greenroom;
pub mod host;
pub mod ifb;
pub mod media;
pub mod mix;
pub mod presence;
pub mod recording;
pub mod remote;
pub mod room;
pub mod rundown;
pub mod timers;
