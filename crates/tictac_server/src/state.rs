//! # Server State
//!
//! Everything the request handlers and gateway loops share: the entity store,
//! the update log, configuration and the two external collaborators (id
//! generation and access control).

use tictac_core::{ClientId, EntityStore, Player, PlayerId};

use crate::access::{AccessControl, CallerKeys};
use crate::config::ServerConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::game::GameEngine;
use crate::ids::{self, IdGenerator, UuidGenerator};
use crate::lobby::LobbyService;
use crate::rematch::RematchCoordinator;
use crate::session::SessionManager;
use crate::update_log::UpdateLog;

/// Shared broker state.
pub struct ServerState {
    /// Entities and cross-reference indices.
    pub store: EntityStore,
    /// Per-client outbound updates.
    pub log: UpdateLog,
    /// Configuration.
    pub config: ServerConfig,
    ids: Box<dyn IdGenerator>,
    access: Box<dyn AccessControl>,
}

impl ServerState {
    /// Creates an empty state with UUID ids and the configured caller keys.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let access = CallerKeys::from_config(&config);
        Self {
            store: EntityStore::new(),
            log: UpdateLog::new(),
            config,
            ids: Box::new(UuidGenerator),
            access: Box::new(access),
        }
    }

    /// Replaces the id generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Replaces the access-control check.
    #[must_use]
    pub fn with_access_control(mut self, access: impl AccessControl + 'static) -> Self {
        self.access = Box::new(access);
        self
    }

    /// Allocates a fresh id that is not `taken`.
    ///
    /// # Errors
    ///
    /// `Internal` once the configured attempts are exhausted.
    pub fn allocate_id<I>(&self, kind: &str, taken: impl Fn(&I) -> bool) -> ServiceResult<I>
    where
        I: From<String>,
    {
        ids::allocate(self.ids.as_ref(), self.config.id_attempts, kind, taken)
    }

    /// Access-control check for a transport caller.
    #[must_use]
    pub fn is_allowed(&self, caller_key: &str) -> bool {
        self.access.is_allowed(caller_key)
    }

    /// The player signed in on `client`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in there.
    pub fn bound_player(&self, client: &ClientId) -> ServiceResult<Player> {
        self.store
            .player_for_client(client)
            .ok_or_else(|| ServiceError::Unauthenticated("sign in first".into()))
    }

    /// The client `player` is signed in from.
    #[must_use]
    pub fn client_of(&self, player: &PlayerId) -> Option<ClientId> {
        self.store.bindings.client_of(player)
    }

    /// Authentication handlers.
    #[must_use]
    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(self)
    }

    /// Lobby handlers.
    #[must_use]
    pub fn lobbies(&self) -> LobbyService<'_> {
        LobbyService::new(self)
    }

    /// Game handlers.
    #[must_use]
    pub fn games(&self) -> GameEngine<'_> {
        GameEngine::new(self)
    }

    /// Rematch handlers.
    #[must_use]
    pub fn rematches(&self) -> RematchCoordinator<'_> {
        RematchCoordinator::new(self)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
