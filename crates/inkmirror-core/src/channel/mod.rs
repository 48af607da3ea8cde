//! Shared last-write-wins channels between drawing contexts.
//!
//! A channel holds a single string value under a key. Writers replace it;
//! every other subscriber is told about the change. A subscriber never hears
//! about its own writes.

mod file;
mod memory;

pub use file::FileChannel;
pub use memory::MemoryChannel;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Default upper bound for a stored value (5 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Channel error: {0}")]
    Other(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Identifies one drawing context (an authoring or viewing surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A value written by another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNotice {
    pub origin: ContextId,
    /// Increases with every write to the channel.
    pub sequence: u64,
    pub value: String,
}

/// Pending change notifications for one subscriber.
pub trait Subscription: Send {
    /// Drain notifications received since the last poll (non-blocking).
    fn poll(&mut self) -> Vec<ChannelNotice>;
}

/// A keyed value shared between contexts.
pub trait SharedChannel: Send + Sync {
    /// Channel key.
    fn key(&self) -> &str;

    /// Replace the stored value.
    ///
    /// A value larger than the channel limit is rejected and the previous
    /// value stays in place.
    fn publish(&self, origin: ContextId, payload: &str) -> ChannelResult<()>;

    /// Current value, if one was ever written.
    fn read(&self) -> ChannelResult<Option<String>>;

    /// Start receiving notifications for writes by any context other than
    /// `origin`. Writes made before this call are not reported.
    fn subscribe(&self, origin: ContextId) -> ChannelResult<Box<dyn Subscription>>;
}

pub(crate) fn check_payload_size(payload: &str, limit: usize) -> ChannelResult<()> {
    if payload.len() > limit {
        return Err(ChannelError::PayloadTooLarge {
            size: payload.len(),
            limit,
        });
    }
    Ok(())
}
