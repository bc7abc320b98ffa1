use std::collections::HashMap;
use undergrid_types::{Entity, EntityId};

/// Entities held in memory, in the order they entered the session.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    order: Vec<EntityId>,
    entities: HashMap<EntityId, Entity>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entity. Replacing keeps the original position.
    pub fn insert(&mut self, id: EntityId, entity: Entity) {
        if self.entities.insert(id, entity).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.order.retain(|other| other != id);
        Some(entity)
    }

    /// Keeps only the entities for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&EntityId, &Entity) -> bool) {
        let entities = &mut self.entities;
        self.order.retain(|id| match entities.get(id) {
            Some(entity) if keep(id, entity) => true,
            _ => {
                entities.remove(id);
                false
            }
        });
    }

    /// Handles in insertion order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id).map(|e| (*id, e)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
