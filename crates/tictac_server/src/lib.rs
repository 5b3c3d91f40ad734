//! # TICTAC Server
//!
//! The session and update-delivery broker behind TICTAC.
//!
//! ## Architecture
//!
//! ```text
//!   transport ──notify(request)──> MatchServer ──> Session / Lobby / Game / Rematch
//!                                                        │
//!                                     mutate EntityStore │ collect Outbox
//!                                                        ▼
//!   transport <──ServerUpdate──── SubscriptionGateway <── UpdateLog (per client)
//! ```
//!
//! - Requests are short-lived and never block on I/O
//! - Every state change is published as updates into the affected clients'
//!   logs, after all store guards are released
//! - One gateway loop per subscribed client drains its log into the stream
//!
//! ## Example
//!
//! ```rust,ignore
//! use tictac_server::{MatchServer, MemorySink, ServerConfig};
//! use tictac_shared::ClientRequest;
//!
//! let server = MatchServer::new(ServerConfig::default());
//! let client = server.register_client()?;
//! server.notify(&client, ClientRequest::SignUp {
//!     name: "alice".into(),
//!     secret: "hunter2".into(),
//! })?;
//!
//! let mut sink = MemorySink::new();
//! server.state().log.drain(&client, &mut sink)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod config;
pub mod error;
pub mod game;
pub mod gateway;
pub mod ids;
pub mod initial;
pub mod lobby;
pub mod rematch;
pub mod server;
pub mod session;
pub mod state;
pub mod stream;
pub mod update_log;
mod views;

pub use access::{AccessControl, CallerKeys};
pub use config::{ConfigError, ServerConfig};
pub use error::{ServiceError, ServiceResult, StreamError};
pub use game::GameEngine;
pub use gateway::SubscriptionGateway;
pub use ids::{IdGenerator, UuidGenerator};
pub use lobby::LobbyService;
pub use rematch::RematchCoordinator;
pub use server::MatchServer;
pub use session::SessionManager;
pub use state::ServerState;
pub use stream::{ChannelSink, MemorySink, UpdateSink};
pub use update_log::{Outbox, Subscription, UpdateLog};

/// Period of the liveness ping on every subscription stream.
pub const DEFAULT_PING_INTERVAL_MS: u64 = 100;

/// Maximum number of lobbies returned by one search.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// How many fresh ids are tried before an allocation gives up.
pub const DEFAULT_ID_ATTEMPTS: u32 = 3;

/// Length of the random suffix of generated display names.
pub const DEFAULT_DISPLAY_NAME_SUFFIX_LEN: usize = 12;
