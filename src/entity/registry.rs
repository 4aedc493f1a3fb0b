use super::{StateBus, SwitchEntity};
use crate::error::{WatchdogError, WatchdogResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Switch entities known to the host, keyed by unique id
pub struct EntityRegistry {
    entities: DashMap<String, Arc<dyn SwitchEntity>>,
    by_entry: DashMap<String, Vec<String>>,
    bus: Arc<StateBus>,
}

impl EntityRegistry {
    pub fn new(bus: Arc<StateBus>) -> Self {
        Self {
            entities: DashMap::new(),
            by_entry: DashMap::new(),
            bus,
        }
    }

    /// Bind each entity to the state bus and register it under its config entry.
    ///
    /// Entities are added in order; a duplicate unique id stops the batch and
    /// leaves the ones before it registered.
    pub fn add_entities(
        &self,
        entry_id: &str,
        entities: Vec<Box<dyn SwitchEntity>>,
    ) -> WatchdogResult<()> {
        for mut entity in entities {
            let unique_id = entity.unique_id().to_string();
            match self.entities.entry(unique_id.clone()) {
                Entry::Occupied(_) => {
                    tracing::error!("Platform already has an entity with unique id {}", unique_id);
                    return Err(WatchdogError::DuplicateUniqueId(unique_id));
                }
                Entry::Vacant(slot) => {
                    entity.bind_state_bus(Arc::clone(&self.bus));
                    slot.insert(Arc::from(entity));
                }
            }

            self.by_entry
                .entry(entry_id.to_string())
                .or_default()
                .push(unique_id.clone());
            tracing::debug!("Registered entity {} for entry {}", unique_id, entry_id);
        }
        Ok(())
    }

    pub fn get(&self, unique_id: &str) -> Option<Arc<dyn SwitchEntity>> {
        self.entities.get(unique_id).map(|e| Arc::clone(e.value()))
    }

    pub fn entities_for_entry(&self, entry_id: &str) -> Vec<Arc<dyn SwitchEntity>> {
        self.by_entry
            .get(entry_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn remove(&self, unique_id: &str) -> Option<Arc<dyn SwitchEntity>> {
        let removed = self.entities.remove(unique_id).map(|(_, entity)| entity);
        for mut ids in self.by_entry.iter_mut() {
            ids.retain(|id| id != unique_id);
        }
        removed
    }

    /// Drop every entity belonging to a config entry, returning how many went
    pub fn remove_entry(&self, entry_id: &str) -> usize {
        let Some((_, ids)) = self.by_entry.remove(entry_id) else {
            return 0;
        };
        ids.iter()
            .filter(|id| self.entities.remove(id.as_str()).is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
