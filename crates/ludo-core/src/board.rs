//! Board geometry: the shared 52-cell ring, per-color entry offsets,
//! and the safe spots where capture cannot occur.

use crate::token::{BASE, Color, HOME, TRACK_LAST};

/// Number of cells on the shared outer track.
pub const TRACK_CELLS: u8 = 52;

/// Global indices where co-located tokens always coexist: the four
/// color entry cells plus the four star cells 8 steps after each entry.
pub const SAFE_SPOTS: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

/// Fixed entry point of each color on the shared ring.
pub fn start_offset(color: Color) -> u8 {
    match color {
        Color::Blue => 0,
        Color::Red => 13,
        Color::Green => 26,
        Color::Yellow => 39,
    }
}

/// Projects a color-relative track position onto the shared ring.
///
/// Returns `None` for tokens in base or on the home stretch; those never
/// participate in cross-color collision checks.
pub fn global_index(color: Color, relative: i8) -> Option<u8> {
    if !(0..=TRACK_LAST).contains(&relative) {
        return None;
    }
    #[allow(clippy::cast_sign_loss)]
    Some((relative as u8 + start_offset(color)) % TRACK_CELLS)
}

pub fn is_safe_spot(global: u8) -> bool {
    SAFE_SPOTS.contains(&global)
}

/// Whether a token at `position` may move by `dice`.
///
/// A token leaves base only on a 6; on the board it may never overshoot
/// the final home cell.
pub fn is_legal_move(position: i8, dice: u8) -> bool {
    if position == BASE {
        dice == 6
    } else {
        position + i8::try_from(dice).unwrap_or(i8::MAX) <= HOME
    }
}
