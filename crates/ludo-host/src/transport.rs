//! Transport contract expected from the peer connection layer, plus an
//! in-memory implementation for tests and the demo binary.
//!
//! The real connection layer is an external collaborator: anything that
//! delivers ordered, reliable, per-connection byte messages and surfaces
//! open/data/close/error events can drive a [`crate::Host`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Process-wide unique identity of one peer connection.
pub type ConnectionId = Uuid;

/// Connection lifecycle and data events delivered to the host.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Opened(ConnectionId),
    Data(ConnectionId, Vec<u8>),
    Closed(ConnectionId),
    Error(ConnectionId, String),
}

/// Outbound half of the transport: fire-and-forget sends and closes
/// toward a peer. Delivery order and reliability are the transport's
/// responsibility.
pub trait Outbound: Send + Sync + 'static {
    fn send(&self, conn: ConnectionId, data: Vec<u8>);
    fn close(&self, conn: ConnectionId);
}

/// What a guest endpoint receives from the host.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    Data(Vec<u8>),
    Closed,
}

/// Loopback transport wiring guests to a host within one process.
#[derive(Clone)]
pub struct MemoryTransport {
    host_tx: mpsc::UnboundedSender<TransportEvent>,
    peers: Arc<Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<PeerEvent>>>>,
}

impl MemoryTransport {
    /// Creates the transport and the host-side event stream.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        (
            Self {
                host_tx,
                peers: Arc::new(Mutex::new(HashMap::new())),
            },
            host_rx,
        )
    }

    /// Dials the host, surfacing an `Opened` event, and returns the
    /// guest's endpoint.
    pub fn connect(&self) -> MemoryConnection {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.lock().insert(id, tx);
        let _ = self.host_tx.send(TransportEvent::Opened(id));
        MemoryConnection {
            id,
            host_tx: self.host_tx.clone(),
            peers: Arc::clone(&self.peers),
            rx,
        }
    }
}

impl Outbound for MemoryTransport {
    fn send(&self, conn: ConnectionId, data: Vec<u8>) {
        if let Some(tx) = self.peers.lock().get(&conn) {
            let _ = tx.send(PeerEvent::Data(data));
        }
    }

    fn close(&self, conn: ConnectionId) {
        if let Some(tx) = self.peers.lock().remove(&conn) {
            let _ = tx.send(PeerEvent::Closed);
            // Close events fire on both ends, like a real socket.
            let _ = self.host_tx.send(TransportEvent::Closed(conn));
        }
    }
}

/// Guest end of a loopback connection.
pub struct MemoryConnection {
    pub id: ConnectionId,
    host_tx: mpsc::UnboundedSender<TransportEvent>,
    peers: Arc<Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<PeerEvent>>>>,
    pub rx: mpsc::UnboundedReceiver<PeerEvent>,
}

impl MemoryConnection {
    /// Sends bytes to the host.
    pub fn send(&self, data: Vec<u8>) {
        let _ = self.host_tx.send(TransportEvent::Data(self.id, data));
    }

    /// Closes the connection from the guest side.
    pub fn close(&self) {
        if self.peers.lock().remove(&self.id).is_some() {
            let _ = self.host_tx.send(TransportEvent::Closed(self.id));
        }
    }
}
