//! Guest-side mirror of the host's canonical state.
//!
//! Snapshots replace the whole mirror; there is no delta application and
//! therefore no merge conflict. Applying the same snapshot twice is a
//! no-op by construction.

use ludo_core::{Color, GameStatus, ProfileField, TokenId};
use ludo_proto::{Message, Snapshot};
use tracing::debug;

/// Guest lifecycle, as seen from the guest process.
#[derive(Debug, Clone, PartialEq)]
pub enum GuestPhase {
    /// JOIN sent, no WELCOME yet.
    Connecting,
    /// Seated with an assigned color.
    Joined { color: Color },
    /// Join refused; terminal, the guest does not retry.
    Blocked { message: String },
    /// Forcibly removed by the host; terminal.
    Removed,
}

/// Local copy of the replicated state plus the guest's own lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestMirror {
    pub phase: GuestPhase,
    pub snapshot: Option<Snapshot>,
}

impl Default for GuestMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestMirror {
    pub fn new() -> Self {
        Self {
            phase: GuestPhase::Connecting,
            snapshot: None,
        }
    }

    /// The color this guest acts for, once seated.
    pub fn my_color(&self) -> Option<Color> {
        match self.phase {
            GuestPhase::Joined { color } => Some(color),
            _ => None,
        }
    }

    /// Whether the guest has reached a terminal screen.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, GuestPhase::Blocked { .. } | GuestPhase::Removed)
    }

    /// Applies one host-originated message.
    pub fn handle_message(&mut self, message: Message) {
        if self.is_terminal() {
            return;
        }
        match message {
            Message::Welcome { color } => {
                debug!(%color, "seated");
                self.phase = GuestPhase::Joined { color };
            }
            Message::Sync(snapshot) => {
                self.snapshot = Some(snapshot);
            }
            Message::Error { message } => {
                self.phase = GuestPhase::Blocked { message };
            }
            Message::Kicked => {
                self.phase = GuestPhase::Removed;
            }
            // Intents only ever travel guest -> host.
            Message::Join | Message::Roll | Message::Move { .. } | Message::UpdateProfile { .. } => {
                debug!("ignoring host-bound message");
            }
        }
    }

    /// Whether the mirrored state shows it is this guest's turn to act.
    fn my_turn(&self) -> Option<&Snapshot> {
        let me = self.my_color()?;
        let snapshot = self.snapshot.as_ref()?;
        let game = &snapshot.game_state;
        (game.status == GameStatus::Playing
            && game.winner.is_none()
            && game.current_player == me)
            .then_some(snapshot)
    }

    /// ROLL intent, offered only when the mirror shows it could be
    /// valid. The host revalidates regardless.
    pub fn roll_intent(&self) -> Option<Message> {
        let snapshot = self.my_turn()?;
        let game = &snapshot.game_state;
        (!game.is_rolling && !game.is_moving && game.dice_value.is_none()).then_some(Message::Roll)
    }

    /// MOVE intent for one of the guest's own tokens.
    pub fn move_intent(&self, token_id: TokenId) -> Option<Message> {
        let me = self.my_color()?;
        let snapshot = self.my_turn()?;
        let game = &snapshot.game_state;
        let token = game.token(token_id)?;
        (token.color() == me && game.dice_value.is_some() && !game.is_moving)
            .then_some(Message::Move { token_id })
    }

    /// Applies a profile edit to the guest's own slot locally and
    /// returns the message to forward to the host.
    pub fn update_profile(&mut self, field: ProfileField, value: String) -> Option<Message> {
        let me = self.my_color()?;
        if let Some(snapshot) = &mut self.snapshot {
            snapshot.profiles.update_field(me, field, value.clone());
        }
        Some(Message::UpdateProfile { field, value })
    }
}
