//! In-process channel.

use super::{
    ChannelError, ChannelNotice, ChannelResult, ContextId, DEFAULT_MAX_PAYLOAD_BYTES,
    SharedChannel, Subscription, check_payload_size,
};
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Default)]
struct State {
    value: Option<String>,
    sequence: u64,
    subscribers: Vec<(ContextId, Sender<ChannelNotice>)>,
}

/// Channel shared by contexts living in the same process.
pub struct MemoryChannel {
    key: String,
    max_payload_bytes: usize,
    state: Mutex<State>,
}

impl MemoryChannel {
    /// Empty channel with the default size limit.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            state: Mutex::new(State::default()),
        }
    }

    /// Set the largest accepted value, in bytes.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    fn lock(&self) -> ChannelResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| ChannelError::Other(format!("Lock error: {}", e)))
    }
}

impl SharedChannel for MemoryChannel {
    fn key(&self) -> &str {
        &self.key
    }

    fn publish(&self, origin: ContextId, payload: &str) -> ChannelResult<()> {
        check_payload_size(payload, self.max_payload_bytes)?;

        let mut state = self.lock()?;
        state.sequence += 1;
        state.value = Some(payload.to_string());

        let notice = ChannelNotice {
            origin,
            sequence: state.sequence,
            value: payload.to_string(),
        };
        // Dropped subscriptions are pruned here.
        state.subscribers.retain(|(subscriber, tx)| {
            *subscriber == origin || tx.send(notice.clone()).is_ok()
        });
        Ok(())
    }

    fn read(&self) -> ChannelResult<Option<String>> {
        Ok(self.lock()?.value.clone())
    }

    fn subscribe(&self, origin: ContextId) -> ChannelResult<Box<dyn Subscription>> {
        let (tx, rx) = channel();
        self.lock()?.subscribers.push((origin, tx));
        Ok(Box::new(MemorySubscription { rx }))
    }
}

struct MemorySubscription {
    rx: Receiver<ChannelNotice>,
}

impl Subscription for MemorySubscription {
    fn poll(&mut self) -> Vec<ChannelNotice> {
        self.rx.try_iter().collect()
    }
}
