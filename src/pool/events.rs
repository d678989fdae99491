use tokio::sync::broadcast;

use crate::types::Value;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Side-channel notifications emitted by the pool. Monitoring only; nothing
/// in the execution path depends on anyone listening.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// The startup probe succeeded and the pool accepts queries.
    Ready,
    /// A single query exceeded the slow threshold.
    SlowQuery {
        sql: String,
        duration_ms: f64,
        params: Vec<Value>,
    },
}

/// Broadcast fan-out for [`PoolEvent`]s. Lagging or absent subscribers are
/// ignored.
#[derive(Debug)]
pub(crate) struct PoolEvents {
    sender: broadcast::Sender<PoolEvent>,
}

impl PoolEvents {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: PoolEvent) {
        // Err means no receivers; fine for a monitoring channel.
        let _ = self.sender.send(event);
    }
}
