// src/entity/events.rs
// Entity state-change notifications pushed to the host

use super::{EntityState, SwitchState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

const MAX_HISTORY: usize = 1000;
const HISTORY_DRAIN: usize = 500;

/// Emitted every time an entity writes its state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChanged {
    pub unique_id: String,
    pub state: SwitchState,
    pub timestamp: DateTime<Utc>,
}

impl From<&EntityState> for StateChanged {
    fn from(snapshot: &EntityState) -> Self {
        Self {
            unique_id: snapshot.unique_id.clone(),
            state: snapshot.state,
            timestamp: snapshot.last_updated,
        }
    }
}

pub type StateReceiver = mpsc::UnboundedReceiver<StateChanged>;
type StateSender = mpsc::UnboundedSender<StateChanged>;

/// Fan-out of entity state writes to every host subscriber
pub struct StateBus {
    subscribers: RwLock<Vec<StateSender>>,
    /// Recent events for debugging
    history: RwLock<Vec<StateChanged>>,
}

impl StateBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Record a state write and deliver it to all live subscribers
    pub async fn publish(&self, event: StateChanged) {
        {
            let mut history = self.history.write().await;
            history.push(event.clone());

            if history.len() > MAX_HISTORY {
                history.drain(0..HISTORY_DRAIN);
            }
        }

        tracing::trace!("State written for {}: {}", event.unique_id, event.state);

        let mut subscribers = self.subscribers.write().await;
        // Drop senders whose receiver is gone
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    pub async fn subscribe(&self) -> StateReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.write().await.push(sender);
        receiver
    }

    pub async fn history(&self, unique_id: Option<&str>) -> Vec<StateChanged> {
        let history = self.history.read().await;
        match unique_id {
            Some(id) => history
                .iter()
                .filter(|event| event.unique_id == id)
                .cloned()
                .collect(),
            None => history.clone(),
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl Default for StateBus {
    fn default() -> Self {
        Self::new()
    }
}
