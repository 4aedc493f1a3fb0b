// Host platform entity model
pub mod events;
pub mod registry;

pub use events::{StateBus, StateChanged, StateReceiver};
pub use registry::EntityRegistry;

use crate::error::WatchdogResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    Off,
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::On => write!(f, "on"),
            SwitchState::Off => write!(f, "off"),
        }
    }
}

/// Metadata tying an entity to the physical device it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifiers: BTreeSet<(String, String)>,
    pub connections: BTreeSet<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// State snapshot written to the host after every mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub state: SwitchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub last_updated: DateTime<Utc>,
}

pub trait Entity: Send + Sync {
    fn unique_id(&self) -> &str;

    fn name(&self) -> Option<&str>;

    fn icon(&self) -> Option<&str> {
        None
    }

    /// Whether `name` is relative to the device name rather than standalone
    fn has_entity_name(&self) -> bool {
        false
    }

    fn device_info(&self) -> Option<&DeviceInfo>;

    fn state_snapshot(&self) -> EntityState;

    /// Called by the registry when the entity is added to the platform
    fn bind_state_bus(&mut self, bus: Arc<StateBus>);
}

#[async_trait]
pub trait SwitchEntity: Entity {
    fn is_on(&self) -> bool;

    async fn turn_on(&self) -> WatchdogResult<()>;

    async fn turn_off(&self) -> WatchdogResult<()>;

    async fn toggle(&self) -> WatchdogResult<()> {
        if self.is_on() {
            self.turn_off().await
        } else {
            self.turn_on().await
        }
    }
}
