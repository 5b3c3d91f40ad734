//! # Update Log
//!
//! Per-client append-only sequence of [`ServerUpdate`]s, a delivery cursor and
//! a single-slot wake-up mailbox.
//!
//! ## Delivery Protocol
//!
//! ```text
//! enqueue:  append ──> try_send(()) on the capacity-1 mailbox
//!                      (full mailbox: dropped, the pending wake-up covers it)
//!
//! drain:    snapshot updates[delivered..] ──> send each in order
//!           ──> delivered += number actually sent ──> free the delivered prefix
//! ```
//!
//! - A failed send stops the drain; the failed update is retried by the next drain
//! - Cursor advances are monotonic, so two racing drains never move it back
//! - Positions stay absolute after the delivered prefix is freed
//! - Removing a mailbox keeps the backlog, so a late enqueue is a harmless no-op wake-up

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tictac_core::ClientId;
use tictac_shared::ServerUpdate;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::StreamError;
use crate::stream::UpdateSink;

// =============================================================================
// OUTBOX
// =============================================================================

/// Updates produced by one operation, grouped per recipient.
///
/// Handlers fill an outbox while they hold store guards and publish it after
/// releasing them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outbox {
    batches: Vec<(ClientId, Vec<ServerUpdate>)>,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds updates for `client`, after everything already queued.
    pub fn push<I>(&mut self, client: &ClientId, updates: I)
    where
        I: IntoIterator<Item = ServerUpdate>,
    {
        let updates: Vec<ServerUpdate> = updates.into_iter().collect();
        if updates.is_empty() {
            return;
        }
        match self.batches.last_mut() {
            Some((last, batch)) if last == client => batch.extend(updates),
            _ => self.batches.push((client.clone(), updates)),
        }
    }

    /// Every update queued for `client`, in order.
    #[must_use]
    pub fn updates_for(&self, client: &ClientId) -> Vec<ServerUpdate> {
        self.batches
            .iter()
            .filter(|(recipient, _)| recipient == client)
            .flat_map(|(_, updates)| updates.iter().cloned())
            .collect()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

// =============================================================================
// PER-CLIENT LOG
// =============================================================================

struct Mailbox {
    generation: u64,
    tx: mpsc::Sender<()>,
}

/// Positions are absolute: `updates[0]` sits at position `base`, and every
/// position below `delivered` has been handed to a sink.
#[derive(Default)]
struct ClientLog {
    updates: Vec<ServerUpdate>,
    base: usize,
    delivered: usize,
    mailbox: Option<Mailbox>,
}

impl ClientLog {
    fn end(&self) -> usize {
        self.base + self.updates.len()
    }

    fn undelivered(&self) -> &[ServerUpdate] {
        &self.updates[self.delivered - self.base..]
    }

    /// Marks `count` updates from `start` as delivered and frees them.
    fn advance(&mut self, start: usize, count: usize) {
        self.delivered = self.delivered.max(start + count);
        self.updates.drain(..self.delivered - self.base);
        self.base = self.delivered;
    }

    fn wake(&self) {
        if let Some(mailbox) = &self.mailbox {
            // Full or closed mailbox: the loop either has a wake-up pending or is gone.
            let _ = mailbox.tx.try_send(());
        }
    }
}

/// A wake-up receiver bound to one stream.
pub struct Subscription {
    /// Identifies the stream that owns the mailbox.
    pub generation: u64,
    /// Receives a unit for every coalesced batch of enqueues. Yields `None`
    /// once a newer stream replaced this one.
    pub signal: mpsc::Receiver<()>,
}

/// Update logs for every client.
#[derive(Default)]
pub struct UpdateLog {
    clients: RwLock<HashMap<ClientId, Arc<Mutex<ClientLog>>>>,
    generations: AtomicU64,
}

impl UpdateLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, client: &ClientId) -> Arc<Mutex<ClientLog>> {
        if let Some(log) = self.clients.read().get(client) {
            return Arc::clone(log);
        }
        Arc::clone(self.clients.write().entry(client.clone()).or_default())
    }

    fn existing(&self, client: &ClientId) -> Option<Arc<Mutex<ClientLog>>> {
        self.clients.read().get(client).map(Arc::clone)
    }

    /// Appends updates to a client's log and wakes its stream.
    pub fn enqueue<I>(&self, client: &ClientId, updates: I)
    where
        I: IntoIterator<Item = ServerUpdate>,
    {
        let entry = self.entry(client);
        let mut log = entry.lock();
        let before = log.end();
        log.updates.extend(updates);
        if log.end() > before {
            trace!(client = %client, count = log.end() - before, "enqueued");
            log.wake();
        }
    }

    /// Enqueues every batch of an outbox, in order.
    pub fn publish(&self, outbox: Outbox) {
        for (client, updates) in outbox.batches {
            self.enqueue(&client, updates);
        }
    }

    /// Sends every undelivered update to `sink`.
    ///
    /// Returns the number of updates sent.
    ///
    /// # Errors
    ///
    /// The sink's error. Updates sent before the failure stay delivered.
    pub fn drain(
        &self,
        client: &ClientId,
        sink: &mut dyn UpdateSink,
    ) -> Result<usize, StreamError> {
        let Some(entry) = self.existing(client) else {
            return Ok(0);
        };

        let (start, pending) = {
            let log = entry.lock();
            (log.delivered, log.undelivered().to_vec())
        };

        let mut sent = 0;
        let mut failure = None;
        for update in pending {
            if let Err(err) = sink.send(update) {
                failure = Some(err);
                break;
            }
            sent += 1;
        }

        if sent > 0 {
            entry.lock().advance(start, sent);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(sent),
        }
    }

    /// Installs a fresh mailbox for a new stream, replacing any previous one.
    ///
    /// The previous stream's receiver observes its channel closing. The new
    /// mailbox starts signalled if updates are already pending.
    pub fn open_mailbox(&self, client: &ClientId) -> Subscription {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, signal) = mpsc::channel(1);
        let entry = self.entry(client);
        let mut log = entry.lock();
        log.mailbox = Some(Mailbox { generation, tx });
        if log.delivered < log.end() {
            log.wake();
        }
        Subscription { generation, signal }
    }

    /// Removes the mailbox if it still belongs to `generation`.
    pub fn close_mailbox(&self, client: &ClientId, generation: u64) -> bool {
        let Some(entry) = self.existing(client) else {
            return false;
        };
        let mut log = entry.lock();
        let owned = log
            .mailbox
            .as_ref()
            .is_some_and(|mailbox| mailbox.generation == generation);
        if owned {
            log.mailbox = None;
        }
        owned
    }

    /// Returns true if a stream is attached to the client.
    #[must_use]
    pub fn has_mailbox(&self, client: &ClientId) -> bool {
        self.existing(client)
            .is_some_and(|entry| entry.lock().mailbox.is_some())
    }

    /// Total number of updates ever enqueued for the client.
    #[must_use]
    pub fn len(&self, client: &ClientId) -> usize {
        self.existing(client)
            .map_or(0, |entry| entry.lock().end())
    }

    /// Number of updates delivered so far.
    #[must_use]
    pub fn delivered(&self, client: &ClientId) -> usize {
        self.existing(client)
            .map_or(0, |entry| entry.lock().delivered)
    }

    /// Number of updates waiting for delivery.
    #[must_use]
    pub fn pending(&self, client: &ClientId) -> usize {
        self.existing(client).map_or(0, |entry| {
            let log = entry.lock();
            log.end() - log.delivered
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemorySink;
    use tictac_shared::NavigationPath;

    fn client() -> ClientId {
        ClientId::from("c1")
    }

    fn nav(path: NavigationPath) -> ServerUpdate {
        ServerUpdate::navigate(path)
    }

    #[test]
    fn test_drain_sends_in_order_once() {
        let log = UpdateLog::new();
        log.enqueue(&client(), [nav(NavigationPath::Welcome), nav(NavigationPath::Home)]);

        let mut sink = MemorySink::new();
        assert_eq!(log.drain(&client(), &mut sink), Ok(2));
        assert_eq!(
            sink.updates(),
            vec![nav(NavigationPath::Welcome), nav(NavigationPath::Home)]
        );

        // Nothing new: nothing sent.
        assert_eq!(log.drain(&client(), &mut sink), Ok(0));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_failed_send_is_retried() {
        let log = UpdateLog::new();
        log.enqueue(
            &client(),
            [
                nav(NavigationPath::Welcome),
                nav(NavigationPath::Home),
                nav(NavigationPath::MyLobby),
            ],
        );

        let mut sink = MemorySink::failing_after(1);
        assert_eq!(log.drain(&client(), &mut sink), Err(StreamError::Closed));
        assert_eq!(log.delivered(&client()), 1);
        assert_eq!(log.pending(&client()), 2);

        sink.fail_after(None);
        assert_eq!(log.drain(&client(), &mut sink), Ok(2));
        assert_eq!(
            sink.updates(),
            vec![
                nav(NavigationPath::Welcome),
                nav(NavigationPath::Home),
                nav(NavigationPath::MyLobby)
            ]
        );
    }

    #[test]
    fn test_delivered_updates_are_freed() {
        let log = UpdateLog::new();
        let mut sink = MemorySink::new();
        for _ in 0..3 {
            log.enqueue(&client(), [nav(NavigationPath::Welcome), nav(NavigationPath::Home)]);
            assert_eq!(log.drain(&client(), &mut sink), Ok(2));
        }
        log.enqueue(&client(), [nav(NavigationPath::MyLobby)]);

        let retained = log.existing(&client()).unwrap().lock().updates.len();
        assert_eq!(retained, 1);
        assert_eq!(log.len(&client()), 7);
        assert_eq!(log.delivered(&client()), 6);
        assert_eq!(log.pending(&client()), 1);

        assert_eq!(log.drain(&client(), &mut sink), Ok(1));
        assert_eq!(sink.updates().last(), Some(&nav(NavigationPath::MyLobby)));
        assert_eq!(sink.len(), 7);
    }

    #[test]
    fn test_coalesced_signals_lose_nothing() {
        let log = UpdateLog::new();
        let mut subscription = log.open_mailbox(&client());

        for _ in 0..5 {
            log.enqueue(&client(), [ServerUpdate::Draw]);
        }

        // Five enqueues, one wake-up.
        assert!(subscription.signal.try_recv().is_ok());
        assert!(subscription.signal.try_recv().is_err());

        let mut sink = MemorySink::new();
        assert_eq!(log.drain(&client(), &mut sink), Ok(5));
    }

    #[test]
    fn test_reopened_mailbox_replaces_old_one() {
        let log = UpdateLog::new();
        let mut first = log.open_mailbox(&client());
        let second = log.open_mailbox(&client());

        assert!(matches!(
            first.signal.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert!(!log.close_mailbox(&client(), first.generation));
        assert!(log.has_mailbox(&client()));
        assert!(log.close_mailbox(&client(), second.generation));
        assert!(!log.has_mailbox(&client()));
    }

    #[test]
    fn test_mailbox_opened_with_backlog_is_signalled() {
        let log = UpdateLog::new();
        log.enqueue(&client(), [ServerUpdate::Draw]);
        let mut subscription = log.open_mailbox(&client());
        assert!(subscription.signal.try_recv().is_ok());
    }

    #[test]
    fn test_enqueue_after_close_keeps_backlog() {
        let log = UpdateLog::new();
        let subscription = log.open_mailbox(&client());
        log.close_mailbox(&client(), subscription.generation);
        log.enqueue(&client(), [ServerUpdate::Draw]);
        assert_eq!(log.pending(&client()), 1);
    }

    #[test]
    fn test_outbox_merges_consecutive_batches() {
        let a = ClientId::from("a");
        let b = ClientId::from("b");
        let mut outbox = Outbox::new();
        outbox.push(&a, [ServerUpdate::Draw]);
        outbox.push(&a, [ServerUpdate::Ping]);
        outbox.push(&b, [ServerUpdate::Draw]);
        outbox.push(&b, Vec::new());

        assert_eq!(outbox.updates_for(&a), vec![ServerUpdate::Draw, ServerUpdate::Ping]);
        assert_eq!(outbox.batches.len(), 2);

        let log = UpdateLog::new();
        log.publish(outbox);
        assert_eq!(log.len(&a), 2);
        assert_eq!(log.len(&b), 1);
    }
}
