//! # Update Sinks
//!
//! The outbound half of a client stream. The transport collaborator provides
//! an [`UpdateSink`]; [`MemorySink`] and [`ChannelSink`] are in-process
//! implementations used by tests, benches and the demonstration binary.

use std::sync::Arc;

use parking_lot::Mutex;
use tictac_shared::ServerUpdate;
use tokio::sync::mpsc;

use crate::error::StreamError;

/// Outbound stream of updates for one client.
pub trait UpdateSink: Send {
    /// Writes one update.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] when the receiving side is gone.
    fn send(&mut self, update: ServerUpdate) -> Result<(), StreamError>;
}

#[derive(Default)]
struct Recorded {
    updates: Vec<ServerUpdate>,
    fail_after: Option<usize>,
}

/// Records every update it receives.
///
/// Clones share the same record, so a test can hand one clone to a gateway
/// and inspect the other. Failure injection makes every write after the
/// `n`-th one fail.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    /// Creates an empty sink that never fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that accepts `n` updates and fails afterwards.
    #[must_use]
    pub fn failing_after(n: usize) -> Self {
        let sink = Self::new();
        sink.fail_after(Some(n));
        sink
    }

    /// Sets or clears the failure threshold.
    pub fn fail_after(&self, n: Option<usize>) {
        self.inner.lock().fail_after = n;
    }

    /// All updates recorded so far, pings included.
    #[must_use]
    pub fn updates(&self) -> Vec<ServerUpdate> {
        self.inner.lock().updates.clone()
    }

    /// Recorded updates without pings.
    #[must_use]
    pub fn updates_without_pings(&self) -> Vec<ServerUpdate> {
        self.inner
            .lock()
            .updates
            .iter()
            .filter(|update| !update.is_ping())
            .cloned()
            .collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<ServerUpdate> {
        std::mem::take(&mut self.inner.lock().updates)
    }

    /// Number of recorded updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().updates.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().updates.is_empty()
    }
}

impl UpdateSink for MemorySink {
    fn send(&mut self, update: ServerUpdate) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        if inner
            .fail_after
            .is_some_and(|limit| inner.updates.len() >= limit)
        {
            return Err(StreamError::Closed);
        }
        inner.updates.push(update);
        Ok(())
    }
}

/// Forwards updates into an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ServerUpdate>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that observes it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UpdateSink for ChannelSink {
    fn send(&mut self, update: ServerUpdate) -> Result<(), StreamError> {
        self.tx.send(update).map_err(|_| StreamError::Closed)
    }
}
