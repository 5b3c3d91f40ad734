//! # Match Server
//!
//! The two entry points the transport collaborator calls: `notify` for
//! tagged requests and `subscribe` for the outbound stream.
//!
//! ## Reply Protocol
//!
//! Every accepted request produces exactly one `Reply` in the requester's log,
//! enqueued before any side-effect update of the same request. Notifications
//! to other clients never carry an outcome.

use tictac_core::{Client, ClientId};
use tictac_shared::{ClientRequest, ServerUpdate};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::SubscriptionGateway;
use crate::state::ServerState;
use crate::stream::UpdateSink;
use crate::update_log::Outbox;

/// The broker.
pub struct MatchServer {
    state: ServerState,
}

impl MatchServer {
    /// Creates a server with UUID ids and the configured caller keys.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_state(ServerState::new(config))
    }

    /// Creates a server over prepared state.
    #[must_use]
    pub fn with_state(state: ServerState) -> Self {
        Self { state }
    }

    /// Shared state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Creates a fresh client identity without opening a stream.
    ///
    /// # Errors
    ///
    /// `Internal` if no id could be allocated.
    pub fn register_client(&self) -> ServiceResult<ClientId> {
        let mut clients = self.state.store.clients.write();
        let id: ClientId = self
            .state
            .allocate_id("client", |id| clients.contains_key(id))?;
        clients.insert(id.clone(), Client::new(id.clone()));
        drop(clients);
        info!(client = %id, "client registered");
        Ok(id)
    }

    /// Handles one request from `client`.
    ///
    /// The outcome, good or bad, reaches the client through its log.
    ///
    /// # Errors
    ///
    /// `NotFound` if `client` was never registered; nothing is logged then.
    pub fn notify(&self, client: &ClientId, request: ClientRequest) -> ServiceResult<()> {
        if !self.state.store.clients.contains(client) {
            return Err(ServiceError::NotFound(format!("client {client} not found")));
        }

        let kind = request.kind();
        match self.dispatch(client, request) {
            Ok(outbox) => {
                debug!(client = %client, ?kind, "request ok");
                self.state.log.enqueue(client, [ServerUpdate::reply_ok(kind)]);
                self.state.log.publish(outbox);
            }
            Err(err) => {
                debug!(client = %client, ?kind, error = %err, "request failed");
                self.state
                    .log
                    .enqueue(client, [ServerUpdate::reply(kind, err.to_outcome())]);
            }
        }
        Ok(())
    }

    fn dispatch(&self, client: &ClientId, request: ClientRequest) -> ServiceResult<Outbox> {
        let state = &self.state;
        match request {
            ClientRequest::SignUp { name, secret } => {
                state.sessions().sign_up(client, &name, &secret)
            }
            ClientRequest::SignIn { name, secret } => {
                state.sessions().sign_in(client, &name, &secret)
            }
            ClientRequest::SignOut => state.sessions().sign_out(client),
            ClientRequest::ChangeDisplayName { display_name } => {
                state.sessions().change_display_name(client, &display_name)
            }
            ClientRequest::CreateLobby { name } => {
                let player = state.bound_player(client)?;
                state.lobbies().create_lobby(client, &player, &name)
            }
            ClientRequest::JoinLobby { lobby_id } => {
                let player = state.bound_player(client)?;
                state.lobbies().join_lobby(client, &player, &lobby_id)
            }
            ClientRequest::LeaveMyLobby => {
                let player = state.bound_player(client)?;
                state.lobbies().leave_my_lobby(client, &player)
            }
            ClientRequest::SearchLobby { name, limit } => {
                state.bound_player(client)?;
                state.lobbies().search_lobby(client, &name, limit)
            }
            ClientRequest::CreateGame { first, second } => {
                let player = state.bound_player(client)?;
                state.games().create_game(client, &player, &first, &second)
            }
            ClientRequest::MakeMove { position } => {
                let player = state.bound_player(client)?;
                state.games().make_move(client, &player, position)
            }
            ClientRequest::Rematch { yes } => {
                let player = state.bound_player(client)?;
                state.rematches().decide(client, &player, yes)
            }
        }
    }

    /// Serves an outbound stream. See [`SubscriptionGateway::run`].
    ///
    /// # Errors
    ///
    /// As [`SubscriptionGateway::run`].
    pub async fn subscribe<S: UpdateSink>(
        &self,
        caller_key: &str,
        client: Option<ClientId>,
        sink: &mut S,
        cancel: oneshot::Receiver<()>,
    ) -> ServiceResult<()> {
        SubscriptionGateway::new(self)
            .run(caller_key, client, sink, cancel, None)
            .await
    }

    /// Serves a stream that also carries inbound requests.
    ///
    /// # Errors
    ///
    /// As [`SubscriptionGateway::run`].
    pub async fn subscribe_bidir<S: UpdateSink>(
        &self,
        caller_key: &str,
        client: Option<ClientId>,
        sink: &mut S,
        requests: mpsc::Receiver<ClientRequest>,
        cancel: oneshot::Receiver<()>,
    ) -> ServiceResult<()> {
        SubscriptionGateway::new(self)
            .run(caller_key, client, sink, cancel, Some(requests))
            .await
    }
}
