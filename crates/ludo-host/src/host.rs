//! The single-writer host runtime.
//!
//! One task owns the engine, roster, and session map. Every input --
//! transport events, the one-second tick, delayed internal actions, and
//! local host commands -- funnels through this task, so state
//! transitions never interleave. Each mutation is followed by a
//! full-state broadcast to all bound connections and to the host's own
//! watch view.
//!
//! Delayed actions (the roll think-delay, the no-move display delay, the
//! capture-marker clear) carry the turn or capture sequence captured at
//! schedule time; a callback whose sequence no longer matches is stale
//! and dropped.

use std::sync::Arc;
use std::time::Duration;

use ludo_core::{
    Color, GameEngine, GameStatus, ProfileField, Roster, TimerTick, TokenId, TurnStep,
};
use ludo_proto::{Message, Snapshot};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::session::SessionManager;
use crate::transport::{ConnectionId, Outbound, TransportEvent};

/// Timing knobs for the host runtime. Defaults give the interactive
/// pacing; tests shrink them to zero for determinism.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Seed for the dice RNG.
    pub seed: u64,
    /// Length of one game "second" (turn timer and lobby countdown).
    pub tick_interval: Duration,
    /// Think-delay between accepting a roll and revealing the value.
    pub roll_delay: Duration,
    /// How long a moveless roll stays visible before auto-finishing.
    pub no_move_delay: Duration,
    /// How long the capture marker stays set.
    pub capture_clear_delay: Duration,
    /// Wait between a terminal ERROR/KICKED send and the close, so the
    /// message is flushed before teardown.
    pub close_flush_delay: Duration,
    /// Lobby countdown length, in ticks.
    pub countdown_secs: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            tick_interval: Duration::from_secs(1),
            roll_delay: Duration::from_millis(800),
            no_move_delay: Duration::from_millis(1500),
            capture_clear_delay: Duration::from_millis(1500),
            close_flush_delay: Duration::from_millis(500),
            countdown_secs: 10,
        }
    }
}

impl HostConfig {
    /// Zero-delay configuration: scheduled actions land on the event
    /// queue immediately and the countdown is skipped.
    pub fn fast(seed: u64) -> Self {
        Self {
            seed,
            roll_delay: Duration::ZERO,
            no_move_delay: Duration::ZERO,
            capture_clear_delay: Duration::ZERO,
            close_flush_delay: Duration::ZERO,
            countdown_secs: 0,
            ..Self::default()
        }
    }
}

/// Local operations available to the host participant.
#[derive(Debug, Clone)]
pub enum HostCommand {
    StartGame,
    AdmitNextPlayers,
    Kick(Color),
    Roll,
    Move(TokenId),
    UpdateProfile { field: ProfileField, value: String },
    Shutdown,
}

#[derive(Debug)]
pub(crate) enum HostEvent {
    Tick,
    RollReady { seq: u64 },
    NoMoveTimeout { seq: u64 },
    CaptureClear { seq: u64 },
    Command(HostCommand),
}

/// Cloneable handle for driving the host and observing its state.
#[derive(Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostEvent>,
    view: watch::Receiver<Snapshot>,
}

impl HostHandle {
    pub fn command(&self, command: HostCommand) {
        let _ = self.tx.send(HostEvent::Command(command));
    }

    pub fn start_game(&self) {
        self.command(HostCommand::StartGame);
    }

    pub fn admit_next_players(&self) {
        self.command(HostCommand::AdmitNextPlayers);
    }

    pub fn kick(&self, color: Color) {
        self.command(HostCommand::Kick(color));
    }

    pub fn roll(&self) {
        self.command(HostCommand::Roll);
    }

    pub fn move_token(&self, token_id: TokenId) {
        self.command(HostCommand::Move(token_id));
    }

    pub fn update_profile(&self, field: ProfileField, value: String) {
        self.command(HostCommand::UpdateProfile { field, value });
    }

    pub fn shutdown(&self) {
        self.command(HostCommand::Shutdown);
    }

    /// The latest published snapshot (the host's own display view).
    pub fn snapshot(&self) -> Snapshot {
        self.view.borrow().clone()
    }

    /// Watch stream of published snapshots.
    pub fn view(&self) -> watch::Receiver<Snapshot> {
        self.view.clone()
    }
}

/// The host runtime. Construct with [`Host::new`], then drive it with
/// [`Host::run`] on a tokio task.
pub struct Host {
    config: HostConfig,
    engine: GameEngine,
    roster: Roster,
    sessions: SessionManager,
    outbound: Arc<dyn Outbound>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    events_rx: mpsc::UnboundedReceiver<HostEvent>,
    events_tx: mpsc::UnboundedSender<HostEvent>,
    view_tx: watch::Sender<Snapshot>,
    /// Remaining lobby countdown ticks, when one is running.
    countdown: Option<u32>,
}

impl Host {
    pub fn new(
        config: HostConfig,
        outbound: Arc<dyn Outbound>,
        transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> (Self, HostHandle) {
        let engine = GameEngine::new(config.seed);
        let roster = Roster::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(Snapshot::of(&engine, &roster));
        let handle = HostHandle {
            tx: events_tx.clone(),
            view: view_rx,
        };
        let host = Self {
            config,
            engine,
            roster,
            sessions: SessionManager::new(),
            outbound,
            transport_rx,
            events_rx,
            events_tx,
            view_tx,
            countdown: None,
        };
        (host, handle)
    }

    /// Runs the event loop until a `Shutdown` command arrives.
    pub async fn run(mut self) {
        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tick.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                _ = tick.tick() => self.handle_tick(),
                Some(event) = self.transport_rx.recv() => self.handle_transport(event),
                event = self.events_rx.recv() => match event {
                    Some(event) => {
                        if !self.handle_event(event) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        info!("host shut down");
    }

    fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::Tick => self.handle_tick(),
            HostEvent::RollReady { seq } => self.handle_roll_ready(seq),
            HostEvent::NoMoveTimeout { seq } => self.handle_no_move_timeout(seq),
            HostEvent::CaptureClear { seq } => self.handle_capture_clear(seq),
            HostEvent::Command(command) => return self.handle_command(command),
        }
        true
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened(conn) => debug!(%conn, "peer connected"),
            TransportEvent::Data(conn, bytes) => self.handle_data(conn, &bytes),
            TransportEvent::Closed(conn) => self.handle_closed(conn),
            TransportEvent::Error(conn, err) => {
                warn!(%conn, error = %err, "connection error");
                self.handle_closed(conn);
            }
        }
    }

    fn handle_data(&mut self, conn: ConnectionId, bytes: &[u8]) {
        let message = match Message::decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                debug!(%conn, error = %err, "ignoring malformed message");
                return;
            }
        };
        match message {
            Message::Join => self.handle_join(conn),
            Message::Roll => {
                if let Some(color) = self.sessions.color_of(conn) {
                    self.try_roll(color);
                } else {
                    trace!(%conn, "roll from unbound connection");
                }
            }
            Message::Move { token_id } => {
                if let Some(color) = self.sessions.color_of(conn) {
                    self.try_move(color, token_id);
                } else {
                    trace!(%conn, "move from unbound connection");
                }
            }
            Message::UpdateProfile { field, value } => {
                if let Some(color) = self.sessions.color_of(conn) {
                    self.roster.update_field(color, field, value);
                    self.broadcast();
                }
            }
            // These only ever travel host -> guest.
            Message::Welcome { .. } | Message::Error { .. } | Message::Kicked | Message::Sync(_) => {
                trace!(%conn, "ignoring guest-bound message");
            }
        }
    }

    fn handle_join(&mut self, conn: ConnectionId) {
        let in_lobby = self.engine.state().status == GameStatus::Lobby;
        match self.sessions.admit(conn, in_lobby) {
            Ok(color) => {
                if !self.roster.get(color).is_remote {
                    let seat = self.sessions.len() + 1;
                    self.roster.bind_remote(color, format!("Player {seat}"));
                }
                info!(%conn, %color, "guest joined");
                self.send(conn, &Message::Welcome { color });
                self.broadcast();
            }
            Err(err) => {
                info!(%conn, %err, "join rejected");
                self.send(
                    conn,
                    &Message::Error {
                        message: err.to_string(),
                    },
                );
                self.close_after_flush(conn);
            }
        }
    }

    fn handle_closed(&mut self, conn: ConnectionId) {
        let Some(color) = self.sessions.release(conn) else {
            return;
        };
        info!(%conn, %color, "guest disconnected");
        self.roster.mark_disconnected(color);
        self.engine.deactivate_color(color, &self.roster);
        self.broadcast();
    }

    fn handle_command(&mut self, command: HostCommand) -> bool {
        match command {
            HostCommand::StartGame => self.handle_start_game(),
            HostCommand::AdmitNextPlayers => self.handle_admit_next(),
            HostCommand::Kick(color) => self.handle_kick(color),
            HostCommand::Roll => self.try_roll(Color::HOST),
            HostCommand::Move(token_id) => self.try_move(Color::HOST, token_id),
            HostCommand::UpdateProfile { field, value } => {
                self.roster.update_field(Color::HOST, field, value);
                self.broadcast();
            }
            HostCommand::Shutdown => return false,
        }
        true
    }

    fn handle_start_game(&mut self) {
        if self.engine.state().status != GameStatus::Lobby || self.countdown.is_some() {
            return;
        }
        self.engine.append_log("Host started countdown...".to_owned());
        self.broadcast();
        if self.config.countdown_secs == 0 {
            self.start_match();
        } else {
            info!(secs = self.config.countdown_secs, "lobby countdown started");
            self.countdown = Some(self.config.countdown_secs);
        }
    }

    fn start_match(&mut self) {
        let active = self.roster.activate_for_game();
        info!(?active, "game started");
        self.engine.start_playing(&active);
        self.broadcast();
    }

    fn handle_admit_next(&mut self) {
        if self.engine.state().status != GameStatus::Finished {
            return;
        }
        let active = self.roster.activate_for_game();
        if self.engine.admit_next(&active) {
            info!(?active, "next match started");
            self.broadcast();
        }
    }

    fn handle_kick(&mut self, color: Color) {
        if color == Color::HOST {
            return;
        }
        if let Some(conn) = self.sessions.kick(color) {
            info!(%conn, %color, "kicking player");
            self.send(conn, &Message::Kicked);
            self.close_after_flush(conn);
        }
        self.roster.clear_slot(color);
        self.engine.deactivate_color(color, &self.roster);
        self.broadcast();
    }

    /// Validates a roll intent and, when accepted, schedules the dice
    /// reveal after the think-delay.
    fn try_roll(&mut self, acting: Color) {
        match self.engine.begin_roll(acting) {
            Ok(seq) => {
                self.broadcast();
                self.schedule(self.config.roll_delay, HostEvent::RollReady { seq });
            }
            Err(err) => trace!(%acting, %err, "roll intent dropped"),
        }
    }

    fn handle_roll_ready(&mut self, seq: u64) {
        if self.engine.turn_seq() != seq {
            trace!("stale roll resolution dropped");
            return;
        }
        let Some(outcome) = self.engine.resolve_roll(&self.roster) else {
            return;
        };
        self.broadcast();
        if !outcome.has_move {
            self.schedule(self.config.no_move_delay, HostEvent::NoMoveTimeout { seq });
        }
    }

    fn handle_no_move_timeout(&mut self, seq: u64) {
        if self.engine.turn_seq() != seq || self.engine.state().dice_value.is_none() {
            trace!("stale no-move auto-finish dropped");
            return;
        }
        self.engine.finish_no_move(&self.roster);
        self.broadcast();
    }

    fn handle_capture_clear(&mut self, seq: u64) {
        if self.engine.clear_capture_event(seq) {
            self.broadcast();
        }
    }

    /// Validates and commits a move intent.
    fn try_move(&mut self, acting: Color, token_id: TokenId) {
        match self.engine.apply_move(acting, token_id, &self.roster) {
            Ok(outcome) => {
                if outcome.captured.is_some() {
                    self.schedule(
                        self.config.capture_clear_delay,
                        HostEvent::CaptureClear {
                            seq: self.engine.capture_seq(),
                        },
                    );
                }
                if outcome.won {
                    info!(winner = %acting, "game finished");
                }
                self.broadcast();
            }
            Err(err) => trace!(%acting, %token_id, %err, "move intent dropped"),
        }
    }

    fn handle_tick(&mut self) {
        if let Some(remaining) = self.countdown {
            if remaining <= 1 {
                self.countdown = None;
                self.start_match();
            } else {
                self.countdown = Some(remaining - 1);
            }
            return;
        }
        match self.engine.tick_timer() {
            TimerTick::Idle => {}
            TimerTick::Counting(_) => self.broadcast(),
            TimerTick::Expired(step) => self.auto_play(step),
        }
    }

    /// Synthesizes an action for an unresponsive player, exactly as if a
    /// validated intent had arrived for the current color.
    fn auto_play(&mut self, step: TurnStep) {
        let current = self.engine.state().current_player;
        match step {
            TurnStep::Roll => {
                debug!(%current, "turn timer expired, rolling automatically");
                self.try_roll(current);
            }
            TurnStep::Move => {
                if let Some(token_id) = self.engine.auto_move_candidate() {
                    debug!(%current, %token_id, "turn timer expired, moving automatically");
                    self.try_move(current, token_id);
                } else {
                    self.engine
                        .finish_turn(&self.roster, "Time's up!".to_owned(), false);
                    self.broadcast();
                }
            }
        }
    }

    /// Publishes the canonical state to every bound connection and to
    /// the host's own view.
    fn broadcast(&mut self) {
        let snapshot = Snapshot::of(&self.engine, &self.roster);
        match Message::Sync(snapshot.clone()).encode() {
            Ok(bytes) => {
                for conn in self.sessions.connections() {
                    self.outbound.send(conn, bytes.clone());
                }
            }
            Err(err) => warn!(error = %err, "failed to encode snapshot"),
        }
        let _ = self.view_tx.send(snapshot);
    }

    fn send(&self, conn: ConnectionId, message: &Message) {
        match message.encode() {
            Ok(bytes) => self.outbound.send(conn, bytes),
            Err(err) => warn!(%conn, error = %err, "failed to encode message"),
        }
    }

    /// Closes a connection after giving the transport time to flush the
    /// terminal message ahead of it.
    fn close_after_flush(&self, conn: ConnectionId) {
        let delay = self.config.close_flush_delay;
        if delay.is_zero() {
            self.outbound.close(conn);
            return;
        }
        let outbound = Arc::clone(&self.outbound);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            outbound.close(conn);
        });
    }

    /// Queues `event` after `delay`. Zero delays enqueue directly so the
    /// zero-delay test configuration stays deterministic.
    fn schedule(&self, delay: Duration, event: HostEvent) {
        if delay.is_zero() {
            let _ = self.events_tx.send(event);
            return;
        }
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }
}
