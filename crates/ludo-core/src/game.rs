//! The canonical game state machine: dice, movement, capture, win
//! detection, and turn rotation.
//!
//! All operations run on the host; guests only ever see the resulting
//! state through snapshots. Move resolution is a single atomic update;
//! stepping tokens across intermediate cells is a presentation concern
//! left to display layers.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{global_index, is_legal_move, is_safe_spot};
use crate::profile::Roster;
use crate::token::{BASE, Color, HOME, TRACK_LAST, Token, TokenId, initial_tokens};

/// Seconds granted for each ROLL or MOVE phase before auto-play takes over.
pub const MOVE_TIMER_SECS: u32 = 15;

/// Trailing log lines retained when a new one is appended.
const LOG_KEEP: usize = 4;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Lobby,
    Playing,
    Finished,
}

/// The two steps of one player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnStep {
    Roll,
    Move,
}

/// Transient marker of the most recent capture's board location.
/// Presentation only; auto-cleared by the host after a short interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub global_index: u8,
}

/// The single canonical game object, broadcast verbatim to guests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub tokens: Vec<Token>,
    pub current_player: Color,
    pub dice_value: Option<u8>,
    pub is_rolling: bool,
    pub is_moving: bool,
    pub game_log: Vec<String>,
    pub winner: Option<Color>,
    pub status: GameStatus,
    pub capture_event: Option<CaptureEvent>,
}

impl GameState {
    fn new() -> Self {
        Self {
            tokens: initial_tokens(),
            current_player: Color::Blue,
            dice_value: None,
            is_rolling: false,
            is_moving: false,
            game_log: vec!["Waiting for players...".to_owned()],
            winner: None,
            status: GameStatus::Lobby,
            capture_event: None,
        }
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// Whether `player` has any token that may move by `dice`.
    pub fn has_legal_move(&self, player: Color, dice: u8) -> bool {
        self.tokens
            .iter()
            .any(|t| t.color() == player && is_legal_move(t.position, dice))
    }

    /// All of `player`'s tokens that may move by `dice`.
    pub fn legal_moves(&self, player: Color, dice: u8) -> Vec<TokenId> {
        self.tokens
            .iter()
            .filter(|t| t.color() == player && is_legal_move(t.position, dice))
            .map(|t| t.id)
            .collect()
    }

    fn push_log(&mut self, line: String) {
        let excess = self.game_log.len().saturating_sub(LOG_KEEP);
        self.game_log.drain(..excess);
        self.game_log.push(line);
    }
}

/// Why an intent was not applied. The host treats all of these as
/// ordinary latency artifacts and drops them silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("game is not in progress")]
    NotPlaying,
    #[error("game already has a winner")]
    GameOver,
    #[error("not this color's turn")]
    NotYourTurn,
    #[error("a roll is already in progress")]
    RollInProgress,
    #[error("a move is already in progress")]
    MoveInProgress,
    #[error("dice already rolled this turn")]
    AlreadyRolled,
    #[error("no dice value to move with")]
    NoDice,
    #[error("no such token on the board")]
    UnknownToken,
    #[error("token does not belong to the current player")]
    NotYourToken,
    #[error("move is not legal for this dice value")]
    IllegalMove,
}

/// Result of resolving a dice roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOutcome {
    pub value: u8,
    /// False when the roll leaves the player with nothing to do; the
    /// host then auto-finishes the turn after a short display delay.
    pub has_move: bool,
}

/// Result of a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub destination: i8,
    pub captured: Option<Color>,
    pub won: bool,
    pub bonus_turn: bool,
}

/// What a one-second timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Countdown gated off (not playing, or an action is in flight).
    Idle,
    /// Seconds remaining after the decrement.
    Counting(u32),
    /// The phase whose time just ran out.
    Expired(TurnStep),
}

/// Owns the canonical [`GameState`] and exposes only validated
/// transitions. The dice RNG is seeded so test runs are reproducible.
#[derive(Debug, Clone)]
pub struct GameEngine {
    state: GameState,
    turn_step: TurnStep,
    move_timer: u32,
    turn_seq: u64,
    capture_seq: u64,
    rng: ChaCha8Rng,
}

impl GameEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            state: GameState::new(),
            turn_step: TurnStep::Roll,
            move_timer: MOVE_TIMER_SECS,
            turn_seq: 0,
            capture_seq: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn turn_step(&self) -> TurnStep {
        self.turn_step
    }

    pub fn move_timer(&self) -> u32 {
        self.move_timer
    }

    /// Bumped on every turn transition. Delayed callbacks capture it at
    /// schedule time and are dropped when it no longer matches.
    pub fn turn_seq(&self) -> u64 {
        self.turn_seq
    }

    /// Bumped on every capture; guards the capture-marker auto-clear.
    pub fn capture_seq(&self) -> u64 {
        self.capture_seq
    }

    /// Starts a roll for `acting`. Returns the turn sequence to pass
    /// back into the delayed [`Self::resolve_roll`].
    pub fn begin_roll(&mut self, acting: Color) -> Result<u64, TurnError> {
        if self.state.status != GameStatus::Playing {
            return Err(TurnError::NotPlaying);
        }
        if self.state.winner.is_some() {
            return Err(TurnError::GameOver);
        }
        if self.state.is_rolling {
            return Err(TurnError::RollInProgress);
        }
        if self.state.is_moving {
            return Err(TurnError::MoveInProgress);
        }
        if self.state.dice_value.is_some() {
            return Err(TurnError::AlreadyRolled);
        }
        if acting != self.state.current_player {
            return Err(TurnError::NotYourTurn);
        }
        self.state.is_rolling = true;
        Ok(self.turn_seq)
    }

    /// Draws the dice value and completes the roll begun by
    /// [`Self::begin_roll`].
    pub fn resolve_roll(&mut self, roster: &Roster) -> Option<RollOutcome> {
        let value = self.rng.random_range(1..=6);
        self.resolve_roll_with(value, roster)
    }

    /// Completes a roll with a known dice value. Returns `None` if no
    /// roll is in flight.
    pub fn resolve_roll_with(&mut self, value: u8, roster: &Roster) -> Option<RollOutcome> {
        if !self.state.is_rolling {
            return None;
        }
        self.state.is_rolling = false;
        self.state.dice_value = Some(value);
        let line = format!("{} rolled a {value}", roster.name(self.state.current_player));
        self.state.push_log(line);

        let has_move = self.state.has_legal_move(self.state.current_player, value);
        // Switch to MOVE even without a legal move so observers see the
        // rolled value before the turn auto-finishes.
        self.turn_step = TurnStep::Move;
        if has_move {
            self.move_timer = MOVE_TIMER_SECS;
        }
        Some(RollOutcome { value, has_move })
    }

    /// Finishes a turn that produced no legal move.
    pub fn finish_no_move(&mut self, roster: &Roster) {
        let line = format!("No valid moves for {}.", roster.name(self.state.current_player));
        self.finish_turn(roster, line, false);
    }

    /// Validates and commits a move for `acting`'s token, including any
    /// capture, the win check, and the turn handoff.
    pub fn apply_move(
        &mut self,
        acting: Color,
        token_id: TokenId,
        roster: &Roster,
    ) -> Result<MoveOutcome, TurnError> {
        if self.state.status != GameStatus::Playing {
            return Err(TurnError::NotPlaying);
        }
        if self.state.winner.is_some() {
            return Err(TurnError::GameOver);
        }
        if self.state.is_moving {
            return Err(TurnError::MoveInProgress);
        }
        let dice = self.state.dice_value.ok_or(TurnError::NoDice)?;
        if acting != self.state.current_player {
            return Err(TurnError::NotYourTurn);
        }
        let token = self.state.token(token_id).ok_or(TurnError::UnknownToken)?;
        if token.color() != self.state.current_player {
            return Err(TurnError::NotYourToken);
        }
        if !is_legal_move(token.position, dice) {
            return Err(TurnError::IllegalMove);
        }

        let token_position = token.position;
        self.state.is_moving = true;

        let mover = self.state.current_player;
        #[allow(clippy::cast_possible_wrap)]
        let destination = if token_position == BASE {
            0
        } else {
            token_position + dice as i8
        };

        // Capture check on the shared ring only; safe spots and the home
        // stretch always allow coexistence.
        let mut captured = None;
        if destination <= TRACK_LAST {
            let landing = global_index(mover, destination).unwrap_or(0);
            if !is_safe_spot(landing) {
                captured = self
                    .state
                    .tokens
                    .iter()
                    .find(|t| {
                        t.color() != mover
                            && t.on_track()
                            && global_index(t.color(), t.position) == Some(landing)
                    })
                    .map(|t| (t.id, landing));
            }
        }

        for t in &mut self.state.tokens {
            if t.id == token_id {
                t.position = destination;
            } else if captured.is_some_and(|(victim, _)| victim == t.id) {
                t.position = BASE;
            }
        }
        if let Some((_, landing)) = captured {
            self.state.capture_event = Some(CaptureEvent {
                global_index: landing,
            });
            self.capture_seq += 1;
        }

        let bonus_turn = dice == 6;
        let mut line = format!("{} moved.", roster.name(mover));
        if let Some((victim, _)) = captured {
            line.push_str(&format!(" Captured {}!", victim.color));
        }
        if destination == HOME {
            line.push_str(" Reached Home!");
        }

        let finished = self
            .state
            .tokens
            .iter()
            .filter(|t| t.color() == mover && t.finished())
            .count();
        let won = finished == 4;

        if won {
            self.state.status = GameStatus::Finished;
            self.state.winner = Some(mover);
            self.state.is_moving = false;
            self.state.dice_value = None;
            self.state.push_log(line);
            self.turn_seq += 1;
        } else {
            self.finish_turn(roster, line, bonus_turn);
        }

        Ok(MoveOutcome {
            destination,
            captured: captured.map(|(victim, _)| victim.color),
            won,
            bonus_turn,
        })
    }

    /// Hands the turn to the next active color (or keeps it on a rolled
    /// six), resets the dice and phase state, and appends `line` to the
    /// log. No-op once a winner is set.
    pub fn finish_turn(&mut self, roster: &Roster, mut line: String, rolled_six: bool) {
        if self.state.winner.is_some() {
            return;
        }
        if rolled_six {
            line.push_str(" Rolled 6! Bonus turn.");
        } else {
            let mut next = self.state.current_player;
            let mut found = false;
            for _ in 0..4 {
                next = next.next();
                if roster.is_active(next) {
                    found = true;
                    break;
                }
            }
            if !found {
                // Unreachable while PLAYING; bail rather than hand the
                // turn to a vacated slot.
                tracing::warn!("no active color to hand the turn to");
                return;
            }
            self.state.current_player = next;
        }
        self.state.dice_value = None;
        self.state.is_moving = false;
        self.state.push_log(line);
        self.turn_step = TurnStep::Roll;
        self.move_timer = MOVE_TIMER_SECS;
        self.turn_seq += 1;
    }

    /// One-second countdown step. Only runs while the game is live and
    /// no roll or move is in flight.
    pub fn tick_timer(&mut self) -> TimerTick {
        if self.state.status != GameStatus::Playing
            || self.state.winner.is_some()
            || self.state.is_rolling
            || self.state.is_moving
        {
            return TimerTick::Idle;
        }
        if self.move_timer > 0 {
            self.move_timer -= 1;
            if self.move_timer > 0 {
                return TimerTick::Counting(self.move_timer);
            }
        }
        TimerTick::Expired(self.turn_step)
    }

    /// Auto-play choice for an expired MOVE phase: the most advanced
    /// token among the legal candidates.
    pub fn auto_move_candidate(&self) -> Option<TokenId> {
        let dice = self.state.dice_value?;
        self.state
            .tokens
            .iter()
            .filter(|t| t.color() == self.state.current_player && is_legal_move(t.position, dice))
            .max_by_key(|t| t.position)
            .map(|t| t.id)
    }

    /// Begins a match among `active` colors with a fresh token set.
    pub fn start_playing(&mut self, active: &[Color]) {
        self.reset_match(active, "Game Started!");
    }

    /// Starts the next match among whoever is still connected, without
    /// returning to the lobby. Only valid once the previous match ended.
    pub fn admit_next(&mut self, active: &[Color]) -> bool {
        if self.state.status != GameStatus::Finished {
            return false;
        }
        self.reset_match(active, "New players admitted!");
        true
    }

    fn reset_match(&mut self, active: &[Color], line: &str) {
        self.state.tokens = initial_tokens()
            .into_iter()
            .filter(|t| active.contains(&t.color()))
            .collect();
        self.state.current_player = active.first().copied().unwrap_or(Color::HOST);
        self.state.dice_value = None;
        self.state.is_rolling = false;
        self.state.is_moving = false;
        self.state.winner = None;
        self.state.capture_event = None;
        self.state.status = GameStatus::Playing;
        self.state.game_log = vec![line.to_owned()];
        self.turn_step = TurnStep::Roll;
        self.move_timer = MOVE_TIMER_SECS;
        self.turn_seq += 1;
    }

    /// Removes a vacated color's tokens. If it was that color's turn,
    /// play continues immediately with a fresh ROLL phase for the next
    /// active color. Call after the roster has been updated.
    pub fn deactivate_color(&mut self, color: Color, roster: &Roster) {
        self.state.tokens.retain(|t| t.color() != color);
        if self.state.status == GameStatus::Playing
            && self.state.winner.is_none()
            && self.state.current_player == color
        {
            tracing::debug!(%color, "vacated color held the turn, advancing");
            let mut next = color;
            for _ in 0..4 {
                next = next.next();
                if roster.is_active(next) {
                    break;
                }
            }
            self.state.current_player = next;
            self.state.dice_value = None;
            self.state.is_rolling = false;
            self.state.is_moving = false;
            self.turn_step = TurnStep::Roll;
            self.move_timer = MOVE_TIMER_SECS;
            self.turn_seq += 1;
        }
    }

    /// Appends a line to the bounded game log.
    pub fn append_log(&mut self, line: String) {
        self.state.push_log(line);
    }

    /// Clears the capture marker if it is still the one scheduled under
    /// `seq`; a marker replaced by a newer capture stays.
    pub fn clear_capture_event(&mut self, seq: u64) -> bool {
        if self.capture_seq == seq && self.state.capture_event.is_some() {
            self.state.capture_event = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SAFE_SPOTS;

    fn token(color: Color, index: u8) -> TokenId {
        TokenId::new(color, index)
    }

    /// Engine in PLAYING state with BLUE (guest) and RED (host) active.
    fn two_player_game() -> (GameEngine, Roster) {
        let mut roster = Roster::new();
        roster.bind_remote(Color::Blue, "Player 2".to_owned());
        let active = roster.activate_for_game();
        let mut engine = GameEngine::new(7);
        engine.start_playing(&active);
        (engine, roster)
    }

    fn set_position(engine: &mut GameEngine, id: TokenId, position: i8) {
        let t = engine
            .state
            .tokens
            .iter_mut()
            .find(|t| t.id == id)
            .expect("token present");
        t.position = position;
    }

    fn roll(engine: &mut GameEngine, roster: &Roster, value: u8) {
        let acting = engine.state.current_player;
        engine.begin_roll(acting).expect("roll accepted");
        engine.resolve_roll_with(value, roster).expect("roll resolved");
    }

    #[test]
    fn test_start_filters_inactive_tokens() {
        let (engine, _) = two_player_game();
        assert_eq!(engine.state.status, GameStatus::Playing);
        assert_eq!(engine.state.tokens.len(), 8);
        assert!(
            engine
                .state
                .tokens
                .iter()
                .all(|t| matches!(t.color(), Color::Blue | Color::Red))
        );
        assert_eq!(engine.state.current_player, Color::Blue);
    }

    #[test]
    fn test_roll_rejected_out_of_turn() {
        let (mut engine, _) = two_player_game();
        assert_eq!(engine.begin_roll(Color::Red), Err(TurnError::NotYourTurn));
    }

    #[test]
    fn test_double_roll_rejected() {
        let (mut engine, roster) = two_player_game();
        engine.begin_roll(Color::Blue).unwrap();
        assert_eq!(engine.begin_roll(Color::Blue), Err(TurnError::RollInProgress));

        engine.resolve_roll_with(6, &roster).unwrap();
        assert_eq!(engine.begin_roll(Color::Blue), Err(TurnError::AlreadyRolled));
    }

    #[test]
    fn test_base_exit_requires_six() {
        let (mut engine, roster) = two_player_game();

        roll(&mut engine, &roster, 3);
        // Everything is in base, so a 3 leaves nothing to do.
        assert_eq!(
            engine.apply_move(Color::Blue, token(Color::Blue, 0), &roster),
            Err(TurnError::IllegalMove)
        );
        engine.finish_no_move(&roster);

        // RED's six brings a token out onto its entry cell.
        roll(&mut engine, &roster, 6);
        let outcome = engine
            .apply_move(Color::Red, token(Color::Red, 0), &roster)
            .unwrap();
        assert_eq!(outcome.destination, 0);
        assert!(outcome.bonus_turn);
    }

    #[test]
    fn test_move_rejects_overshoot() {
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 0), 55);
        roll(&mut engine, &roster, 3);
        assert_eq!(
            engine.apply_move(Color::Blue, token(Color::Blue, 0), &roster),
            Err(TurnError::IllegalMove)
        );
    }

    #[test]
    fn test_positions_stay_in_range() {
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 0), 55);
        set_position(&mut engine, token(Color::Blue, 1), 10);
        roll(&mut engine, &roster, 1);
        engine
            .apply_move(Color::Blue, token(Color::Blue, 0), &roster)
            .unwrap();
        assert!(
            engine
                .state
                .tokens
                .iter()
                .all(|t| (BASE..=HOME).contains(&t.position))
        );
    }

    #[test]
    fn test_capture_on_unsafe_cell() {
        // BLUE at relative 10 sits on global 10. RED moving 46 -> 49
        // lands on global (49 + 13) % 52 == 10 and captures it.
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 2), 10);
        set_position(&mut engine, token(Color::Red, 0), 46);
        engine.state.current_player = Color::Red;

        roll(&mut engine, &roster, 3);
        let outcome = engine
            .apply_move(Color::Red, token(Color::Red, 0), &roster)
            .unwrap();

        assert_eq!(outcome.captured, Some(Color::Blue));
        assert_eq!(outcome.destination, 49);
        assert_eq!(engine.state.token(token(Color::Blue, 2)).unwrap().position, BASE);
        assert_eq!(engine.state.token(token(Color::Red, 0)).unwrap().position, 49);
        assert_eq!(engine.state.capture_event, Some(CaptureEvent { global_index: 10 }));
        // No six was rolled, so the turn passes to the next active color.
        assert_eq!(engine.state.current_player, Color::Blue);
    }

    #[test]
    fn test_no_capture_on_any_safe_spot() {
        for &spot in &SAFE_SPOTS {
            let (mut engine, roster) = two_player_game();
            engine.state.current_player = Color::Red;

            // BLUE occupies the safe spot (offset 0: relative == global).
            #[allow(clippy::cast_possible_wrap)]
            set_position(&mut engine, token(Color::Blue, 0), spot as i8);

            // Pick a RED move of exactly six steps landing on that spot.
            let dest = i8::try_from((u32::from(spot) + 39) % 52).unwrap();
            if dest >= 6 {
                set_position(&mut engine, token(Color::Red, 0), dest - 6);
            }
            roll(&mut engine, &roster, 6);
            let outcome = engine
                .apply_move(Color::Red, token(Color::Red, 0), &roster)
                .unwrap();

            assert_eq!(outcome.captured, None, "capture on safe spot {spot}");
            assert_eq!(outcome.destination, dest);
            #[allow(clippy::cast_possible_wrap)]
            let blue_pos = engine.state.token(token(Color::Blue, 0)).unwrap().position;
            assert_eq!(blue_pos, spot as i8, "blue displaced on safe spot {spot}");
            assert!(engine.state.capture_event.is_none());
        }
    }

    #[test]
    fn test_own_tokens_coexist_anywhere() {
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 0), 10);
        set_position(&mut engine, token(Color::Blue, 1), 7);
        roll(&mut engine, &roster, 3);
        let outcome = engine
            .apply_move(Color::Blue, token(Color::Blue, 1), &roster)
            .unwrap();
        assert_eq!(outcome.captured, None);
        assert_eq!(engine.state.token(token(Color::Blue, 0)).unwrap().position, 10);
        assert_eq!(engine.state.token(token(Color::Blue, 1)).unwrap().position, 10);
    }

    #[test]
    fn test_win_requires_all_four_home() {
        let (mut engine, roster) = two_player_game();
        engine.state.current_player = Color::Red;
        for index in 0..3 {
            set_position(&mut engine, token(Color::Red, index), HOME);
        }
        set_position(&mut engine, token(Color::Red, 3), 54);

        // Three home plus one short of home: not a win.
        roll(&mut engine, &roster, 1);
        let outcome = engine
            .apply_move(Color::Red, token(Color::Red, 3), &roster)
            .unwrap();
        assert!(!outcome.won);
        assert_eq!(engine.state.winner, None);
        assert_eq!(engine.state.status, GameStatus::Playing);

        // BLUE passes, then RED's last step wins.
        roll(&mut engine, &roster, 2);
        engine.finish_no_move(&roster);
        roll(&mut engine, &roster, 1);
        let outcome = engine
            .apply_move(Color::Red, token(Color::Red, 3), &roster)
            .unwrap();
        assert!(outcome.won);
        assert_eq!(engine.state.winner, Some(Color::Red));
        assert_eq!(engine.state.status, GameStatus::Finished);
        assert!(!engine.state.is_moving);
    }

    #[test]
    fn test_turn_advance_skips_inactive() {
        let (mut engine, mut roster) = two_player_game();
        roster.bind_remote(Color::Green, "Player 3".to_owned());
        roster.activate_for_game();
        engine.start_playing(&[Color::Blue, Color::Green]);
        roster.get_mut(Color::Red).is_active = false;
        roster.get_mut(Color::Yellow).is_active = false;

        engine.finish_turn(&roster, "Blue passed.".to_owned(), false);
        assert_eq!(engine.state.current_player, Color::Green);

        engine.finish_turn(&roster, "Green passed.".to_owned(), false);
        assert_eq!(engine.state.current_player, Color::Blue);
    }

    #[test]
    fn test_rolled_six_keeps_current_player() {
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 0), 5);
        roll(&mut engine, &roster, 6);
        engine
            .apply_move(Color::Blue, token(Color::Blue, 0), &roster)
            .unwrap();
        assert_eq!(engine.state.current_player, Color::Blue);
        assert_eq!(engine.state.dice_value, None);
        assert_eq!(engine.turn_step(), TurnStep::Roll);
        assert!(
            engine
                .state
                .game_log
                .last()
                .unwrap()
                .ends_with("Rolled 6! Bonus turn.")
        );
    }

    #[test]
    fn test_host_six_from_base_scenario() {
        // BLUE and RED active; the host (RED) rolls a six and enters.
        let (mut engine, roster) = two_player_game();
        engine.state.current_player = Color::Red;

        roll(&mut engine, &roster, 6);
        engine
            .apply_move(Color::Red, token(Color::Red, 0), &roster)
            .unwrap();

        assert_eq!(engine.state.token(token(Color::Red, 0)).unwrap().position, 0);
        assert_eq!(engine.state.dice_value, None);
        assert_eq!(engine.state.current_player, Color::Red);
        assert_eq!(engine.turn_step(), TurnStep::Roll);
    }

    #[test]
    fn test_no_move_roll_still_shows_value() {
        let (mut engine, roster) = two_player_game();
        let outcome = {
            engine.begin_roll(Color::Blue).unwrap();
            engine.resolve_roll_with(4, &roster).unwrap()
        };
        assert!(!outcome.has_move);
        assert_eq!(engine.turn_step(), TurnStep::Move);
        assert_eq!(engine.state.dice_value, Some(4));

        engine.finish_no_move(&roster);
        assert_eq!(engine.state.current_player, Color::Red);
        assert_eq!(engine.state.dice_value, None);
        assert!(
            engine
                .state
                .game_log
                .iter()
                .any(|l| l.starts_with("No valid moves"))
        );
    }

    #[test]
    fn test_timer_expires_after_fifteen_ticks() {
        let (mut engine, _) = two_player_game();
        for expected in (1..MOVE_TIMER_SECS).rev() {
            assert_eq!(engine.tick_timer(), TimerTick::Counting(expected));
        }
        assert_eq!(engine.tick_timer(), TimerTick::Expired(TurnStep::Roll));
    }

    #[test]
    fn test_timer_idle_while_rolling() {
        let (mut engine, _) = two_player_game();
        engine.begin_roll(Color::Blue).unwrap();
        assert_eq!(engine.tick_timer(), TimerTick::Idle);
    }

    #[test]
    fn test_timer_idle_outside_game() {
        let mut engine = GameEngine::new(1);
        assert_eq!(engine.tick_timer(), TimerTick::Idle);
    }

    #[test]
    fn test_auto_move_picks_most_advanced() {
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 0), 12);
        set_position(&mut engine, token(Color::Blue, 1), 30);
        set_position(&mut engine, token(Color::Blue, 2), 55);
        roll(&mut engine, &roster, 3);
        // b3 at 55 cannot move by 3; b2 at 30 is the best legal pick.
        assert_eq!(engine.auto_move_candidate(), Some(token(Color::Blue, 1)));
    }

    #[test]
    fn test_deactivate_current_player_advances_turn() {
        let (mut engine, mut roster) = two_player_game();
        roll(&mut engine, &roster, 6);

        roster.mark_disconnected(Color::Blue);
        engine.deactivate_color(Color::Blue, &roster);

        assert!(engine.state.tokens.iter().all(|t| t.color() != Color::Blue));
        assert_eq!(engine.state.current_player, Color::Red);
        assert_eq!(engine.state.dice_value, None);
        assert_eq!(engine.turn_step(), TurnStep::Roll);
        assert_eq!(engine.move_timer(), MOVE_TIMER_SECS);
    }

    #[test]
    fn test_admit_next_starts_new_match() {
        let (mut engine, roster) = two_player_game();
        engine.state.current_player = Color::Red;
        for index in 0..3 {
            set_position(&mut engine, token(Color::Red, index), HOME);
        }
        set_position(&mut engine, token(Color::Red, 3), 55);
        roll(&mut engine, &roster, 1);
        engine
            .apply_move(Color::Red, token(Color::Red, 3), &roster)
            .unwrap();
        assert_eq!(engine.state.status, GameStatus::Finished);

        assert!(engine.admit_next(&roster.active_colors()));
        assert_eq!(engine.state.status, GameStatus::Playing);
        assert_eq!(engine.state.winner, None);
        assert_eq!(engine.state.current_player, Color::Blue);
        assert_eq!(engine.state.tokens.len(), 8);
        assert!(engine.state.tokens.iter().all(|t| t.position == BASE));
        assert_eq!(engine.state.game_log, vec!["New players admitted!".to_owned()]);
    }

    #[test]
    fn test_admit_next_only_after_finish() {
        let (mut engine, roster) = two_player_game();
        assert!(!engine.admit_next(&roster.active_colors()));
    }

    #[test]
    fn test_game_log_stays_bounded() {
        let (mut engine, roster) = two_player_game();
        for _ in 0..10 {
            let acting = engine.state.current_player;
            engine.begin_roll(acting).unwrap();
            engine.resolve_roll_with(2, &roster).unwrap();
            engine.finish_no_move(&roster);
        }
        assert!(engine.state.game_log.len() <= 5);
    }

    #[test]
    fn test_capture_marker_clear_is_guarded() {
        let (mut engine, roster) = two_player_game();
        set_position(&mut engine, token(Color::Blue, 2), 10);
        set_position(&mut engine, token(Color::Red, 0), 46);
        engine.state.current_player = Color::Red;
        roll(&mut engine, &roster, 3);
        engine
            .apply_move(Color::Red, token(Color::Red, 0), &roster)
            .unwrap();

        let seq = engine.capture_seq();
        // A stale clear (older sequence) must leave the marker alone.
        assert!(!engine.clear_capture_event(seq - 1));
        assert!(engine.state.capture_event.is_some());
        assert!(engine.clear_capture_event(seq));
        assert!(engine.state.capture_event.is_none());
    }

    #[test]
    fn test_stale_turn_seq_detectable() {
        let (mut engine, roster) = two_player_game();
        let seq = engine.begin_roll(Color::Blue).unwrap();
        engine.resolve_roll_with(2, &roster).unwrap();
        assert_eq!(engine.turn_seq(), seq);
        engine.finish_no_move(&roster);
        assert_ne!(engine.turn_seq(), seq);
    }
}
