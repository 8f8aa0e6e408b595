//! Token and color primitives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a token still waiting in its base.
pub const BASE: i8 = -1;

/// Last relative step on the shared outer track.
pub const TRACK_LAST: i8 = 50;

/// Final home-stretch step; a token here is finished.
pub const HOME: i8 = 56;

/// The four player colors, listed in fixed turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Red,
    Green,
    Yellow,
}

impl Color {
    /// Cyclic turn order BLUE -> RED -> GREEN -> YELLOW.
    pub const ORDER: [Color; 4] = [Color::Blue, Color::Red, Color::Green, Color::Yellow];

    /// The color slot permanently owned by the host process.
    pub const HOST: Color = Color::Red;

    /// Slot assignment preference order for joining guests.
    pub const GUEST_PREFERENCE: [Color; 3] = [Color::Blue, Color::Green, Color::Yellow];

    /// The color after `self` in turn order.
    pub fn next(self) -> Color {
        match self {
            Color::Blue => Color::Red,
            Color::Red => Color::Green,
            Color::Green => Color::Yellow,
            Color::Yellow => Color::Blue,
        }
    }

    /// Index into per-color tables.
    pub fn index(self) -> usize {
        match self {
            Color::Blue => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
        }
    }

    fn letter(self) -> char {
        match self {
            Color::Blue => 'b',
            Color::Red => 'r',
            Color::Green => 'g',
            Color::Yellow => 'y',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Blue => "blue",
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
        };
        f.write_str(name)
    }
}

/// Identifies one of a color's four tokens, e.g. `r1` or `y4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub color: Color,
    /// Ordinal within the color, 0..=3.
    pub index: u8,
}

impl TokenId {
    pub fn new(color: Color, index: u8) -> Self {
        debug_assert!(index < 4);
        Self { color, index }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.letter(), self.index + 1)
    }
}

/// A single playing piece.
///
/// `position` is color-relative: `-1` in base, `0..=50` on the shared
/// outer track (0 = this color's entry cell), `51..=56` on the private
/// home stretch, `56` finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub position: i8,
}

impl Token {
    pub fn new(id: TokenId) -> Self {
        Self { id, position: BASE }
    }

    pub fn color(&self) -> Color {
        self.id.color
    }

    /// Whether the token sits on the shared outer track.
    pub fn on_track(&self) -> bool {
        (0..=TRACK_LAST).contains(&self.position)
    }

    /// Whether the token has reached the final home cell.
    pub fn finished(&self) -> bool {
        self.position == HOME
    }
}

/// The full 16-token starting set, all in base.
pub fn initial_tokens() -> Vec<Token> {
    let mut tokens = Vec::with_capacity(16);
    for color in Color::ORDER {
        for index in 0..4 {
            tokens.push(Token::new(TokenId::new(color, index)));
        }
    }
    tokens
}
