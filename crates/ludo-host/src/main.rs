//! Ludo-Link host demo
//!
//! Runs a complete match over the in-memory transport: three scripted
//! guests join and play their turns from the snapshots they mirror, the
//! host plays its own seat through the handle, and the turn timer's
//! auto-play covers anything left. Pacing is compressed so the whole
//! run takes seconds.

use std::sync::Arc;
use std::time::Duration;

use ludo_core::{Color, GameState, GameStatus, TurnStep};
use ludo_host::{Host, HostConfig, HostHandle, MemoryConnection, MemoryTransport, PeerEvent};
use ludo_proto::{Message, Snapshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// What a participant should do with the turn shown in a snapshot.
enum Action {
    Roll,
    Move(ludo_core::TokenId),
    Wait,
}

fn choose_action(game: &GameState, turn_step: TurnStep, me: Color) -> Action {
    if game.status != GameStatus::Playing
        || game.winner.is_some()
        || game.current_player != me
        || game.is_rolling
        || game.is_moving
    {
        return Action::Wait;
    }
    match turn_step {
        TurnStep::Roll if game.dice_value.is_none() => Action::Roll,
        TurnStep::Move => match game.dice_value {
            Some(dice) => game
                .legal_moves(me, dice)
                .first()
                .copied()
                .map_or(Action::Wait, Action::Move),
            None => Action::Wait,
        },
        TurnStep::Roll => Action::Wait,
    }
}

/// Mirrors snapshots on a guest connection and plays that seat's turns.
async fn run_guest(mut conn: MemoryConnection) {
    let mut my_color = None;
    while let Some(event) = conn.rx.recv().await {
        match event {
            PeerEvent::Data(bytes) => match Message::decode(&bytes) {
                Ok(Message::Welcome { color }) => {
                    tracing::info!(%color, "guest seated");
                    my_color = Some(color);
                }
                Ok(Message::Sync(snapshot)) => {
                    let Some(me) = my_color else { continue };
                    let intent = match choose_action(&snapshot.game_state, snapshot.turn_step, me) {
                        Action::Roll => Some(Message::Roll),
                        Action::Move(token_id) => Some(Message::Move { token_id }),
                        Action::Wait => None,
                    };
                    if let Some(intent) = intent {
                        match intent.encode() {
                            Ok(bytes) => conn.send(bytes),
                            Err(err) => tracing::warn!(error = %err, "guest failed to encode"),
                        }
                    }
                }
                Ok(other) => tracing::info!(?other, "guest notified"),
                Err(err) => tracing::warn!(error = %err, "guest failed to decode"),
            },
            PeerEvent::Closed => break,
        }
    }
}

/// Plays the host's own seat from the published view.
async fn run_host_seat(handle: HostHandle) {
    let mut view = handle.view();
    while view.changed().await.is_ok() {
        let snapshot: Snapshot = view.borrow_and_update().clone();
        match choose_action(&snapshot.game_state, snapshot.turn_step, Color::HOST) {
            Action::Roll => handle.roll(),
            Action::Move(token_id) => handle.move_token(token_id),
            Action::Wait => {}
        }
        if snapshot.game_state.winner.is_some() {
            break;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = HostConfig {
        tick_interval: Duration::from_millis(20),
        roll_delay: Duration::from_millis(5),
        no_move_delay: Duration::from_millis(10),
        capture_clear_delay: Duration::from_millis(10),
        close_flush_delay: Duration::from_millis(5),
        countdown_secs: 2,
        ..HostConfig::default()
    };

    let (transport, transport_rx) = MemoryTransport::new();
    let (host, handle) = Host::new(config, Arc::new(transport.clone()), transport_rx);
    let host_task = tokio::spawn(host.run());
    tokio::spawn(run_host_seat(handle.clone()));

    for _ in 0..3 {
        let conn = transport.connect();
        conn.send(Message::Join.encode()?);
        tokio::spawn(run_guest(conn));
    }

    // Give the joins a moment to settle, then start the countdown.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.start_game();

    let mut view = handle.view();
    let winner = loop {
        view.changed().await?;
        let winner = view.borrow_and_update().game_state.winner;
        if let Some(winner) = winner {
            break winner;
        }
    };

    let snapshot = handle.snapshot();
    tracing::info!(%winner, "match finished");
    for line in &snapshot.game_state.game_log {
        tracing::info!("log: {line}");
    }

    handle.shutdown();
    host_task.await?;
    Ok(())
}
