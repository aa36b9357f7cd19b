//! Repository layer — query functions organized by domain entity.

pub mod audio_outputs;
pub mod audio_sources;
pub mod chat;
pub mod cues;
pub mod ifb;
pub mod participants;
pub mod recordings;
pub mod rooms;
pub mod rundowns;
pub mod talkback;
pub mod timers;
pub mod whip;
