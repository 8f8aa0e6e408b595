//! Player profiles and the fixed four-slot roster.

use serde::{Deserialize, Serialize};

use crate::token::Color;

/// Display and participation state of one color slot.
///
/// Slots are never added or removed, only toggled: a vacated slot keeps
/// existing with `is_active`/`is_remote` cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    /// Optional flag image reference shown next to the name.
    pub flag: Option<String>,
    /// Participates in the current or next game.
    pub is_active: bool,
    /// Bound to a live peer connection. Always false for the host's own
    /// slot, which is locally controlled.
    pub is_remote: bool,
    /// Legacy flag from the local-only era; the engine never consults it.
    pub is_bot: bool,
}

impl PlayerProfile {
    fn waiting() -> Self {
        Self {
            name: "Waiting...".to_owned(),
            flag: None,
            is_active: true,
            is_remote: false,
            is_bot: false,
        }
    }

    fn host() -> Self {
        Self {
            name: "Host (You)".to_owned(),
            ..Self::waiting()
        }
    }
}

/// Editable profile fields a participant may change on their own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    Name,
    Flag,
}

/// The four color slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    slots: [PlayerProfile; 4],
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    /// Default roster: host slot named, the other three waiting.
    pub fn new() -> Self {
        let mut slots = [
            PlayerProfile::waiting(),
            PlayerProfile::waiting(),
            PlayerProfile::waiting(),
            PlayerProfile::waiting(),
        ];
        slots[Color::HOST.index()] = PlayerProfile::host();
        Self { slots }
    }

    pub fn get(&self, color: Color) -> &PlayerProfile {
        &self.slots[color.index()]
    }

    pub fn get_mut(&mut self, color: Color) -> &mut PlayerProfile {
        &mut self.slots[color.index()]
    }

    pub fn is_active(&self, color: Color) -> bool {
        self.get(color).is_active
    }

    /// Display name for log lines.
    pub fn name(&self, color: Color) -> &str {
        &self.get(color).name
    }

    /// Binds a slot to a newly admitted guest.
    pub fn bind_remote(&mut self, color: Color, name: String) {
        let slot = self.get_mut(color);
        slot.is_remote = true;
        slot.is_active = true;
        slot.is_bot = false;
        slot.name = name;
    }

    /// Marks a slot's connection as lost. The slot stays in the roster as
    /// "Disconnected" but no longer participates in turn order.
    pub fn mark_disconnected(&mut self, color: Color) {
        let slot = self.get_mut(color);
        slot.is_remote = false;
        slot.is_active = false;
        slot.name = "Disconnected".to_owned();
    }

    /// Clears a slot after a kick: inactive, unbound, identity reset.
    pub fn clear_slot(&mut self, color: Color) {
        let slot = self.get_mut(color);
        slot.is_active = false;
        slot.is_remote = false;
        slot.name = "Empty".to_owned();
        slot.flag = None;
    }

    /// Applies a field edit to one slot.
    pub fn update_field(&mut self, color: Color, field: ProfileField, value: String) {
        let slot = self.get_mut(color);
        match field {
            ProfileField::Name => slot.name = value,
            ProfileField::Flag => slot.flag = Some(value),
        }
    }

    /// Recomputes which colors take part in a match: the host's own slot
    /// always does, the others only while bound to a live connection.
    /// Returns the active colors in turn order.
    pub fn activate_for_game(&mut self) -> Vec<Color> {
        let mut active = Vec::new();
        for color in Color::ORDER {
            let participates = color == Color::HOST || self.get(color).is_remote;
            self.get_mut(color).is_active = participates;
            if participates {
                active.push(color);
            }
        }
        active
    }

    /// Colors currently flagged active, in turn order.
    pub fn active_colors(&self) -> Vec<Color> {
        Color::ORDER
            .into_iter()
            .filter(|&c| self.is_active(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let roster = Roster::new();
        assert_eq!(roster.name(Color::Red), "Host (You)");
        assert_eq!(roster.name(Color::Blue), "Waiting...");
        assert!(roster.is_active(Color::Blue));
        assert!(!roster.get(Color::Blue).is_remote);
    }

    #[test]
    fn test_activate_for_game_requires_connection() {
        let mut roster = Roster::new();
        roster.bind_remote(Color::Green, "Player 2".to_owned());

        let active = roster.activate_for_game();

        assert_eq!(active, vec![Color::Red, Color::Green]);
        assert!(!roster.is_active(Color::Blue));
        assert!(!roster.is_active(Color::Yellow));
    }

    #[test]
    fn test_disconnect_deactivates_slot() {
        let mut roster = Roster::new();
        roster.bind_remote(Color::Blue, "Player 2".to_owned());
        roster.activate_for_game();

        roster.mark_disconnected(Color::Blue);

        assert!(!roster.is_active(Color::Blue));
        assert!(!roster.get(Color::Blue).is_remote);
        assert_eq!(roster.name(Color::Blue), "Disconnected");
    }

    #[test]
    fn test_clear_slot_resets_identity() {
        let mut roster = Roster::new();
        roster.bind_remote(Color::Yellow, "Player 2".to_owned());
        roster.update_field(Color::Yellow, ProfileField::Flag, "br.png".to_owned());

        roster.clear_slot(Color::Yellow);

        let slot = roster.get(Color::Yellow);
        assert_eq!(slot.name, "Empty");
        assert_eq!(slot.flag, None);
        assert!(!slot.is_active);
        assert!(!slot.is_remote);
    }
}
