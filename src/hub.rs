// Integration data the host keeps per config entry
use crate::coordinator::MonitoringCoordinator;
use crate::entity::{EntityRegistry, StateBus};
use crate::error::{WatchdogError, WatchdogResult};
use crate::switch;
use dashmap::DashMap;
use std::sync::Arc;

pub struct Hub<C> {
    coordinators: DashMap<String, Arc<C>>,
    registry: EntityRegistry,
    bus: Arc<StateBus>,
}

impl<C: MonitoringCoordinator + 'static> Hub<C> {
    pub fn new() -> Self {
        let bus = Arc::new(StateBus::new());
        Self {
            coordinators: DashMap::new(),
            registry: EntityRegistry::new(Arc::clone(&bus)),
            bus,
        }
    }

    pub fn insert_coordinator(&self, coordinator: Arc<C>) -> Option<Arc<C>> {
        let entry_id = coordinator.entry_id().to_string();
        tracing::debug!("Registering coordinator for {} ({})", entry_id, coordinator.address());
        self.coordinators.insert(entry_id, coordinator)
    }

    pub fn coordinator(&self, entry_id: &str) -> Option<Arc<C>> {
        self.coordinators.get(entry_id).map(|c| Arc::clone(c.value()))
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<StateBus> {
        &self.bus
    }

    /// Forward a config entry to the switch platform and register what it adds
    pub async fn async_setup_entry(&self, entry_id: &str) -> WatchdogResult<()> {
        switch::async_setup_entry(self, entry_id, |entities| {
            self.registry.add_entities(entry_id, entities)
        })
        .await?;
        tracing::info!("Set up entry {}", entry_id);
        Ok(())
    }

    /// Tear down an entry: drop its entities, then disconnect its coordinator
    pub async fn async_unload_entry(&self, entry_id: &str) -> WatchdogResult<()> {
        let (_, coordinator) = self
            .coordinators
            .remove(entry_id)
            .ok_or_else(|| WatchdogError::EntryNotFound(entry_id.to_string()))?;

        let removed = self.registry.remove_entry(entry_id);
        tracing::debug!("Removed {} entities for {}", removed, entry_id);

        coordinator.set_update_interval(None);
        coordinator.async_disconnect().await?;
        tracing::info!("Unloaded entry {}", entry_id);
        Ok(())
    }
}

impl<C: MonitoringCoordinator + 'static> Default for Hub<C> {
    fn default() -> Self {
        Self::new()
    }
}
