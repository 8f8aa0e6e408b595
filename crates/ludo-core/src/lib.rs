//! Ludo-Link Core Library
//!
//! The host-authoritative game state machine: board geometry, token
//! movement rules, capture and win detection, and the four-slot player
//! roster. Everything here is synchronous and deterministic; timing and
//! networking live in `ludo-host`.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod board;
pub mod game;
pub mod profile;
pub mod token;

pub use board::{SAFE_SPOTS, TRACK_CELLS, global_index, is_legal_move, is_safe_spot, start_offset};
pub use game::{
    CaptureEvent, GameEngine, GameState, GameStatus, MOVE_TIMER_SECS, MoveOutcome, RollOutcome,
    TimerTick, TurnError, TurnStep,
};
pub use profile::{PlayerProfile, ProfileField, Roster};
pub use token::{BASE, Color, HOME, TRACK_LAST, Token, TokenId, initial_tokens};
