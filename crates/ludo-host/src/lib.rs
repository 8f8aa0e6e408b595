//! Ludo-Link Host Runtime
//!
//! Everything that runs only on the host process: the session manager
//! binding connections to color slots, the single-writer event loop
//! around the core engine, the turn timer with auto-play, and the lobby
//! countdown / admit-next lifecycle. The peer transport itself is an
//! external collaborator; see [`transport`] for the contract and the
//! in-memory implementation used by tests and the demo binary.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod host;
pub mod session;
pub mod transport;

pub use host::{Host, HostCommand, HostConfig, HostHandle};
pub use session::{JoinError, SessionManager};
pub use transport::{
    ConnectionId, MemoryConnection, MemoryTransport, Outbound, PeerEvent, TransportEvent,
};
