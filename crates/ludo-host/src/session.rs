//! Session management: binding peer connections to color slots.
//!
//! The host permanently owns one color; the remaining three are handed
//! out to inbound connections in a fixed preference order. The mapping
//! is bidirectional so both "which color may this connection act for"
//! and "which connection do I notify for this color" are O(1).

use std::collections::HashMap;

use ludo_core::Color;

use crate::transport::ConnectionId;

/// Why a join request was turned away. The message text is sent to the
/// rejected connection verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Room is full (4 players max)")]
    RoomFull,
    #[error("Game already in progress")]
    GameInProgress,
}

/// Host-only record of which connection is bound to which color.
/// Never replicated to guests.
#[derive(Debug, Default)]
pub struct SessionManager {
    by_conn: HashMap<ConnectionId, Color>,
    by_color: HashMap<Color, ConnectionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a connection to the first free guest slot.
    ///
    /// Re-admitting an already bound connection returns its existing
    /// color, so a duplicated JOIN is harmless.
    pub fn admit(&mut self, conn: ConnectionId, in_lobby: bool) -> Result<Color, JoinError> {
        if let Some(&color) = self.by_conn.get(&conn) {
            return Ok(color);
        }
        if !in_lobby {
            return Err(JoinError::GameInProgress);
        }
        let color = Color::GUEST_PREFERENCE
            .into_iter()
            .find(|c| !self.by_color.contains_key(c))
            .ok_or(JoinError::RoomFull)?;
        self.by_conn.insert(conn, color);
        self.by_color.insert(color, conn);
        Ok(color)
    }

    /// Unbinds a closed connection. Returns the freed color, or `None`
    /// if the connection held no slot.
    pub fn release(&mut self, conn: ConnectionId) -> Option<Color> {
        let color = self.by_conn.remove(&conn)?;
        self.by_color.remove(&color);
        Some(color)
    }

    /// Unbinds a color ahead of a forced removal. Returns the evicted
    /// connection so the host can notify and close it.
    pub fn kick(&mut self, color: Color) -> Option<ConnectionId> {
        let conn = self.by_color.remove(&color)?;
        self.by_conn.remove(&conn);
        Some(conn)
    }

    /// The color a connection may act for.
    pub fn color_of(&self, conn: ConnectionId) -> Option<Color> {
        self.by_conn.get(&conn).copied()
    }

    /// The connection currently bound to a color.
    pub fn connection_of(&self, color: Color) -> Option<ConnectionId> {
        self.by_color.get(&color).copied()
    }

    /// All bound connections, for broadcasts.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.by_conn.keys().copied()
    }

    /// Number of bound guest connections.
    pub fn len(&self) -> usize {
        self.by_conn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_conn.is_empty()
    }
}
