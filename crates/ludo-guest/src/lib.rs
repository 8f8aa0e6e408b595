//! Ludo-Link Guest Library
//!
//! A guest is a thin input/display terminal: it dials the host found in
//! the invite link, sends intents, and mirrors whatever canonical state
//! arrives in snapshots. Nothing here ever applies a game action
//! locally.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod invite;
pub mod mirror;

pub use invite::{host_addr, invite_link};
pub use mirror::{GuestMirror, GuestPhase};
