//! Snapshot replication between an authoring context and its viewers.
//!
//! The authoring side owns a [`SnapshotPublisher`] that coalesces changes
//! through a [`Debouncer`] and writes whole snapshots to a [`SharedChannel`].
//! Each viewer owns a [`SnapshotListener`] that replaces its local
//! [`StrokeStore`] with whatever was written last.

use crate::channel::{ChannelError, ContextId, SharedChannel, Subscription};
use crate::debounce::Debouncer;
use crate::outline::OutlineOptions;
use crate::protocol::{self, ProtocolError, Snapshot};
use crate::store::StrokeStore;
use crate::stroke::Stroke;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Replication errors.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Publisher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    /// Nothing waiting to be written.
    Idle,
    /// A snapshot is waiting for its debounce window.
    Writing,
}

/// Result of one write attempt.
#[derive(Debug)]
pub enum PublishOutcome {
    Written { stroke_count: usize, bytes: usize },
    Cleared,
    Failed(ReplicationError),
}

impl PublishOutcome {
    /// Whether the write reached the channel.
    pub fn is_success(&self) -> bool {
        !matches!(self, PublishOutcome::Failed(_))
    }
}

/// Writes debounced snapshots of an authoring store to a channel.
pub struct SnapshotPublisher<C: SharedChannel + ?Sized> {
    channel: Arc<C>,
    origin: ContextId,
    debouncer: Debouncer<Vec<Stroke>>,
    seen_revision: Option<u64>,
}

impl<C: SharedChannel + ?Sized> SnapshotPublisher<C> {
    /// Create an idle publisher with a fresh origin id.
    pub fn new(channel: Arc<C>, debounce: Duration) -> Self {
        Self {
            channel,
            origin: ContextId::new(),
            debouncer: Debouncer::new(debounce),
            seen_revision: None,
        }
    }

    /// Id this publisher writes under.
    pub fn origin(&self) -> ContextId {
        self.origin
    }

    /// `Writing` while a snapshot waits for its window.
    pub fn state(&self) -> PublisherState {
        if self.debouncer.is_pending() {
            PublisherState::Writing
        } else {
            PublisherState::Idle
        }
    }

    /// When the pending snapshot will be written.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Schedule a snapshot if the store changed since the last call.
    ///
    /// Returns whether a snapshot was scheduled.
    pub fn notify_changed(&mut self, store: &StrokeStore, now: Instant) -> bool {
        let revision = store.revision();
        if self.seen_revision == Some(revision) {
            return false;
        }
        self.seen_revision = Some(revision);
        self.debouncer.schedule(store.snapshot(), now);
        true
    }

    /// Write the pending snapshot once its window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<PublishOutcome> {
        let strokes = self.debouncer.take_due(now)?;
        Some(self.write(&strokes))
    }

    /// Write the pending snapshot immediately.
    pub fn flush(&mut self) -> Option<PublishOutcome> {
        let strokes = self.debouncer.take()?;
        Some(self.write(&strokes))
    }

    /// Write a clear marker now, dropping any pending snapshot.
    pub fn publish_clear(&mut self, store: &StrokeStore) -> PublishOutcome {
        if self.debouncer.cancel() {
            log::debug!("Pending snapshot superseded by clear");
        }
        self.seen_revision = Some(store.revision());
        self.write(&[])
    }

    fn write(&self, strokes: &[Stroke]) -> PublishOutcome {
        let result = protocol::encode_snapshot(strokes)
            .map_err(ReplicationError::from)
            .and_then(|payload| {
                self.channel.publish(self.origin, &payload)?;
                Ok(payload.len())
            });

        match result {
            Ok(_) if strokes.is_empty() => {
                log::info!("Published clear to {}", self.channel.key());
                PublishOutcome::Cleared
            }
            Ok(bytes) => {
                log::debug!(
                    "Published {} strokes ({} bytes) to {}",
                    strokes.len(),
                    bytes,
                    self.channel.key()
                );
                PublishOutcome::Written {
                    stroke_count: strokes.len(),
                    bytes,
                }
            }
            Err(e) => {
                log::error!("Failed to publish to {}: {}", self.channel.key(), e);
                PublishOutcome::Failed(e)
            }
        }
    }
}

/// Listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Listening,
}

/// What a received payload did to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationEvent {
    Updated { stroke_count: usize },
    Cleared,
    /// The payload was invalid and the drawing was left as it was.
    Ignored { reason: String },
}

/// Mirrors the snapshot on a channel into a local store.
pub struct SnapshotListener<C: SharedChannel + ?Sized> {
    channel: Arc<C>,
    origin: ContextId,
    subscription: Option<Box<dyn Subscription>>,
    store: StrokeStore,
}

impl<C: SharedChannel + ?Sized> SnapshotListener<C> {
    /// `options` is the outline template used to rebuild received strokes.
    pub fn new(channel: Arc<C>, options: OutlineOptions) -> Self {
        Self {
            channel,
            origin: ContextId::new(),
            subscription: None,
            store: StrokeStore::new(options),
        }
    }

    /// Id this listener subscribes under.
    pub fn origin(&self) -> ContextId {
        self.origin
    }

    /// `Listening` between mount and unmount.
    pub fn state(&self) -> ListenerState {
        if self.subscription.is_some() {
            ListenerState::Listening
        } else {
            ListenerState::Idle
        }
    }

    /// The mirrored drawing.
    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    /// Subscribe, then show whatever is already on the channel.
    ///
    /// Subscribing first means a write landing between the two steps is
    /// still delivered by the next [`poll`](Self::poll). Returns the event
    /// for the resident value, if there was one. Mounting twice is a no-op.
    pub fn mount(&mut self) -> Result<Option<ReplicationEvent>, ReplicationError> {
        if self.subscription.is_some() {
            return Ok(None);
        }
        self.subscription = Some(self.channel.subscribe(self.origin)?);
        log::info!("Listening on {}", self.channel.key());

        match self.channel.read() {
            Ok(Some(payload)) => Ok(Some(self.apply(&payload))),
            Ok(None) => Ok(None),
            Err(e) => {
                log::warn!("Could not read resident value of {}: {}", self.channel.key(), e);
                Ok(None)
            }
        }
    }

    /// Stop listening. The mirrored drawing is kept.
    pub fn unmount(&mut self) {
        if self.subscription.take().is_some() {
            log::info!("Stopped listening on {}", self.channel.key());
        }
    }

    /// Apply every notification received since the last poll, in order.
    pub fn poll(&mut self) -> Vec<ReplicationEvent> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Vec::new();
        };
        let notices = subscription.poll();
        notices
            .into_iter()
            .map(|notice| self.apply(&notice.value))
            .collect()
    }

    fn apply(&mut self, payload: &str) -> ReplicationEvent {
        match protocol::decode(payload) {
            Ok(Snapshot::Strokes(strokes)) => {
                let stroke_count = strokes.len();
                self.store.load_snapshot(strokes);
                log::debug!("Mirrored {} strokes", stroke_count);
                ReplicationEvent::Updated { stroke_count }
            }
            Ok(Snapshot::Cleared) => {
                self.store.clear();
                log::debug!("Mirror cleared");
                ReplicationEvent::Cleared
            }
            Err(e) => {
                log::warn!("Ignoring invalid payload on {}: {}", self.channel.key(), e);
                ReplicationEvent::Ignored {
                    reason: e.to_string(),
                }
            }
        }
    }
}
