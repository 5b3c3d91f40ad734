//! # Subscription Gateway
//!
//! The per-client delivery loop behind a stream.
//!
//! ## Loop
//!
//! ```text
//! open:  access check -> resolve/register client -> ClientAssignment
//!        -> install mailbox -> enqueue initial state -> drain
//!
//! loop:  cancel      -> stop (Canceled)
//!        ping tick   -> send Ping
//!        wake-up     -> drain the log
//!        mailbox gone-> stop (a newer stream took over)
//!        request     -> notify (bidirectional streams only)
//! ```
//!
//! Every exit path removes the mailbox if it still belongs to this stream.
//! Undelivered updates stay, so the next stream catches up from the cursor.

use tictac_core::ClientId;
use tictac_shared::{ClientRequest, ServerUpdate};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::initial::initial_updates;
use crate::server::MatchServer;
use crate::stream::UpdateSink;
use crate::update_log::UpdateLog;

/// Removes the stream's mailbox when the loop exits.
struct MailboxGuard<'a> {
    log: &'a UpdateLog,
    client: ClientId,
    generation: u64,
}

impl Drop for MailboxGuard<'_> {
    fn drop(&mut self) {
        if self.log.close_mailbox(&self.client, self.generation) {
            debug!(client = %self.client, generation = self.generation, "mailbox removed");
        }
    }
}

/// Runs subscription streams against a [`MatchServer`].
pub struct SubscriptionGateway<'a> {
    server: &'a MatchServer,
}

impl<'a> SubscriptionGateway<'a> {
    /// Creates a gateway.
    #[must_use]
    pub fn new(server: &'a MatchServer) -> Self {
        Self { server }
    }

    /// Serves one stream until it is cancelled, superseded or fails to write.
    ///
    /// `client` is the id the caller already holds; `None` registers a new
    /// client. When `requests` is given, inbound requests are dispatched for
    /// this client; their end-of-stream stops only the inbound half.
    ///
    /// Returns `Ok(())` when a newer stream for the same client took over.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for a rejected caller key, `NotFound` for an
    /// unknown client id, `Canceled` on cancellation or a failed write.
    pub async fn run<S: UpdateSink>(
        &self,
        caller_key: &str,
        client: Option<ClientId>,
        sink: &mut S,
        mut cancel: oneshot::Receiver<()>,
        mut requests: Option<mpsc::Receiver<ClientRequest>>,
    ) -> ServiceResult<()> {
        let state = self.server.state();
        if !state.is_allowed(caller_key) {
            warn!("subscribe rejected by access control");
            return Err(ServiceError::PermissionDenied("caller key not allowed".into()));
        }

        let client = match client {
            Some(client) if state.store.clients.contains(&client) => client,
            Some(client) => {
                return Err(ServiceError::NotFound(format!("client {client} not found")));
            }
            None => self.server.register_client()?,
        };

        sink.send(ServerUpdate::ClientAssignment {
            client_id: client.clone(),
        })?;

        let mut subscription = state.log.open_mailbox(&client);
        let _guard = MailboxGuard {
            log: &state.log,
            client: client.clone(),
            generation: subscription.generation,
        };
        info!(client = %client, generation = subscription.generation, "stream opened");

        state.log.enqueue(&client, initial_updates(state, &client));
        state.log.drain(&client, &mut *sink)?;

        let mut ticker = time::interval(state.config.ping_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut requests_open = requests.is_some();
        loop {
            tokio::select! {
                _ = &mut cancel => {
                    info!(client = %client, "stream cancelled");
                    return Err(ServiceError::Canceled("subscribe was cancelled".into()));
                }
                _ = ticker.tick() => {
                    sink.send(ServerUpdate::Ping)?;
                }
                signal = subscription.signal.recv() => {
                    if signal.is_none() {
                        info!(client = %client, "stream superseded");
                        return Ok(());
                    }
                    state.log.drain(&client, &mut *sink)?;
                }
                request = next_request(&mut requests), if requests_open => {
                    match request {
                        Some(request) => {
                            if let Err(err) = self.server.notify(&client, request) {
                                warn!(client = %client, error = %err, "inbound request rejected");
                            }
                        }
                        None => {
                            debug!(client = %client, "inbound half closed");
                            requests_open = false;
                        }
                    }
                }
            }
        }
    }
}

async fn next_request(
    requests: &mut Option<mpsc::Receiver<ClientRequest>>,
) -> Option<ClientRequest> {
    match requests {
        Some(rx) => rx.recv().await,
        None => None,
    }
}
