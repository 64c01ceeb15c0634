//! Markov Tables — compile a word corpus into a fixed-width binary
//! transition graph and replay it with constant memory.
//!
//! The build side (`core::builder`, `core::grouper`, `core::encoder`) turns a
//! token stream into three offset-addressable tables. The read side
//! (`core::reader`, `core::walker`) only ever seeks to computed offsets, so the
//! same blob can be walked from flash, an SD card, a file or a memory slice.

pub mod core;
pub mod schema;
