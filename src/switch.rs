//! Switch platform for Hughes Power Watchdog.
//!
//! One switch per configured device lets the user pause monitoring: turning
//! it off drops the Bluetooth connection and stops the connection watchdog,
//! turning it on brings both back.

use crate::consts::{CONNECTION_CHECK_INTERVAL, SWITCH_MONITORING};
use crate::coordinator::MonitoringCoordinator;
use crate::entity::{
    DeviceInfo, Entity, EntityState, StateBus, StateChanged, SwitchEntity, SwitchState,
};
use crate::error::{WatchdogError, WatchdogResult};
use crate::hub::Hub;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

const NAME: &str = "Monitoring";
const ICON: &str = "mdi:connection";

/// Set up the switches for a config entry.
///
/// Looks up the coordinator the integration registered for the entry and
/// hands a single monitoring switch to `add_entities`.
pub async fn async_setup_entry<C, F>(
    hub: &Hub<C>,
    entry_id: &str,
    add_entities: F,
) -> WatchdogResult<()>
where
    C: MonitoringCoordinator + 'static,
    F: FnOnce(Vec<Box<dyn SwitchEntity>>) -> WatchdogResult<()>,
{
    let coordinator = hub
        .coordinator(entry_id)
        .ok_or_else(|| WatchdogError::EntryNotFound(entry_id.to_string()))?;

    let switch: Box<dyn SwitchEntity> = Box::new(MonitoringSwitch::new(coordinator));
    add_entities(vec![switch])
}

pub fn monitoring_unique_id(entry_id: &str) -> String {
    format!("{}_{}", entry_id, SWITCH_MONITORING)
}

/// Toggle bound to the coordinator's monitoring flag
pub struct MonitoringSwitch<C> {
    coordinator: Arc<C>,
    unique_id: String,
    device_info: DeviceInfo,
    /// Value seen at construction; `is_on` always reads the coordinator
    initial_state: bool,
    bus: Option<Arc<StateBus>>,
}

impl<C: MonitoringCoordinator> MonitoringSwitch<C> {
    pub fn new(coordinator: Arc<C>) -> Self {
        Self {
            unique_id: monitoring_unique_id(coordinator.entry_id()),
            device_info: coordinator.device_info(),
            initial_state: coordinator.monitoring_enabled(),
            coordinator,
            bus: None,
        }
    }

    pub fn coordinator(&self) -> &Arc<C> {
        &self.coordinator
    }

    pub fn initial_state(&self) -> bool {
        self.initial_state
    }

    async fn write_state(&self) -> WatchdogResult<()> {
        let bus = self
            .bus
            .as_ref()
            .ok_or_else(|| WatchdogError::NotAttached(self.unique_id.clone()))?;
        bus.publish(StateChanged::from(&self.state_snapshot())).await;
        Ok(())
    }
}

impl<C: MonitoringCoordinator> Entity for MonitoringSwitch<C> {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> Option<&str> {
        Some(NAME)
    }

    fn icon(&self) -> Option<&str> {
        Some(ICON)
    }

    fn has_entity_name(&self) -> bool {
        true
    }

    fn device_info(&self) -> Option<&DeviceInfo> {
        Some(&self.device_info)
    }

    fn state_snapshot(&self) -> EntityState {
        EntityState {
            unique_id: self.unique_id.clone(),
            state: SwitchState::from(self.is_on()),
            name: self.name().map(String::from),
            icon: self.icon().map(String::from),
            last_updated: Utc::now(),
        }
    }

    fn bind_state_bus(&mut self, bus: Arc<StateBus>) {
        self.bus = Some(bus);
    }
}

#[async_trait]
impl<C: MonitoringCoordinator> SwitchEntity for MonitoringSwitch<C> {
    fn is_on(&self) -> bool {
        self.coordinator.monitoring_enabled()
    }

    async fn turn_on(&self) -> WatchdogResult<()> {
        // Resume the connection watchdog, then reconnect right away
        self.coordinator
            .set_update_interval(Some(CONNECTION_CHECK_INTERVAL));
        self.coordinator.start_monitoring();
        self.coordinator.async_refresh().await?;

        self.write_state().await?;
        tracing::debug!("Monitoring enabled for {}", self.coordinator.address());
        Ok(())
    }

    async fn turn_off(&self) -> WatchdogResult<()> {
        self.coordinator.set_update_interval(None);
        self.coordinator.async_disconnect().await?;

        self.write_state().await?;
        tracing::debug!("Monitoring disabled for {}", self.coordinator.address());
        Ok(())
    }
}
