//! In-process change notification hub.
//!
//! Every write that other sessions care about publishes a [`ChangeNotice`]
//! on the channel of its table. Notices carry the row id only; subscribers
//! re-read whatever they display.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

const DEFAULT_CAPACITY: usize = 256;

/// Table a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Posts.
    Post,
    /// Direct messages.
    Message,
}

impl Table {
    /// Storage name of the table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Message => "message",
        }
    }
}

/// What happened to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    /// A row was inserted.
    Insert,
    /// Notices were dropped because the subscriber fell behind; re-read everything.
    Resync,
}

/// A change notification. Never carries row content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNotice {
    pub table: Table,
    pub operation: ChangeOperation,
    /// Affected row, `None` for [`ChangeOperation::Resync`].
    pub row_id: Option<String>,
}

impl ChangeNotice {
    const fn resync(table: Table) -> Self {
        Self {
            table,
            operation: ChangeOperation::Resync,
            row_id: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Envelope {
    notice: ChangeNotice,
    /// Identities the row concerns. Empty means everyone.
    audience: Vec<String>,
}

impl Envelope {
    fn concerns(&self, user_id: Option<&str>) -> bool {
        match user_id {
            None => true,
            Some(id) => self.audience.is_empty() || self.audience.iter().any(|a| a == id),
        }
    }
}

/// Per-table broadcast hub.
#[derive(Clone)]
pub struct ChangeFeed {
    posts: Arc<broadcast::Sender<Envelope>>,
    messages: Arc<broadcast::Sender<Envelope>>,
}

impl ChangeFeed {
    /// Create a hub whose channels buffer `capacity` notices per table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (posts, _) = broadcast::channel(capacity.max(1));
        let (messages, _) = broadcast::channel(capacity.max(1));

        Self {
            posts: Arc::new(posts),
            messages: Arc::new(messages),
        }
    }

    fn sender(&self, table: Table) -> &broadcast::Sender<Envelope> {
        match table {
            Table::Post => &self.posts,
            Table::Message => &self.messages,
        }
    }

    /// Publish an insert on `table`.
    ///
    /// `audience` limits delivery to subscribers scoped to one of those
    /// identities; pass an empty list to reach every subscriber of the table.
    /// Returns how many subscriptions were handed the notice.
    pub fn publish_insert(&self, table: Table, row_id: &str, audience: Vec<String>) -> usize {
        let envelope = Envelope {
            notice: ChangeNotice {
                table,
                operation: ChangeOperation::Insert,
                row_id: Some(row_id.to_string()),
            },
            audience,
        };

        // Err only means nobody is listening.
        let delivered = self.sender(table).send(envelope).unwrap_or(0);
        tracing::debug!(table = table.as_str(), row_id = %row_id, delivered, "Published change notice");
        delivered
    }

    /// Subscribe to every notice on `table`.
    #[must_use]
    pub fn subscribe(&self, table: Table) -> Subscription {
        Subscription {
            table,
            user_id: None,
            receiver: self.sender(table).subscribe(),
        }
    }

    /// Subscribe to notices on `table` that concern `user_id`.
    #[must_use]
    pub fn subscribe_for(&self, table: Table, user_id: &str) -> Subscription {
        Subscription {
            table,
            user_id: Some(user_id.to_string()),
            receiver: self.sender(table).subscribe(),
        }
    }

    /// Number of live subscriptions on `table`.
    #[must_use]
    pub fn subscriber_count(&self, table: Table) -> usize {
        self.sender(table).receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A scoped registration on one table of a [`ChangeFeed`].
///
/// Dropping the handle releases the registration.
pub struct Subscription {
    table: Table,
    user_id: Option<String>,
    receiver: broadcast::Receiver<Envelope>,
}

impl Subscription {
    /// Table this subscription listens on.
    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    /// Wait for the next relevant notice.
    ///
    /// Returns `None` once the feed itself is gone. A subscriber that fell
    /// behind gets a [`ChangeOperation::Resync`] notice instead of the
    /// dropped ones.
    pub async fn recv(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.concerns(self.user_id.as_deref()) => {
                    return Some(envelope.notice);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(table = self.table.as_str(), skipped, "Subscriber lagged");
                    return Some(ChangeNotice::resync(self.table));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next relevant notice if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) if envelope.concerns(self.user_id.as_deref()) => {
                    return Some(envelope.notice);
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(_)) => return Some(ChangeNotice::resync(self.table)),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Release the registration now.
    pub fn close(self) {}
}

/// Subscription to direct messages involving one identity.
pub type MessageSubscription = Subscription;
