//! Definition repositories

use ahash::AHashMap;

use crate::core::error::{CombatError, Result};
use crate::core::types::DefinitionId;

/// A static definition with an id and a unique name
pub trait Definition {
    /// Human-readable kind, used in error messages
    const KIND: &'static str;

    fn id(&self) -> DefinitionId;
    fn name(&self) -> &str;
}

/// Read access to a set of definitions
pub trait Repository<T: Definition> {
    fn get(&self, id: DefinitionId) -> Option<&T>;
    fn get_by_name(&self, name: &str) -> Option<&T>;

    fn require(&self, id: DefinitionId) -> Result<&T> {
        self.get(id).ok_or_else(|| CombatError::DefinitionNotFound {
            kind: T::KIND,
            key: id.to_string(),
        })
    }

    fn require_by_name(&self, name: &str) -> Result<&T> {
        self.get_by_name(name)
            .ok_or_else(|| CombatError::DefinitionNotFound {
                kind: T::KIND,
                key: name.to_string(),
            })
    }
}

/// In-memory repository keyed by id with a case-insensitive name index
#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: AHashMap<DefinitionId, T>,
    by_name: AHashMap<String, DefinitionId>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: AHashMap::new(),
            by_name: AHashMap::new(),
        }
    }
}

impl<T: Definition> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; duplicate ids or names are rejected
    pub fn insert(&mut self, item: T) -> Result<()> {
        let key = item.name().to_lowercase();
        if self.items.contains_key(&item.id()) || self.by_name.contains_key(&key) {
            return Err(CombatError::InvalidDefinition {
                kind: T::KIND,
                name: item.name().to_string(),
                reason: format!("duplicate id {} or name", item.id()),
            });
        }
        self.by_name.insert(key, item.id());
        self.items.insert(item.id(), item);
        Ok(())
    }

    /// First id not yet in use
    pub fn next_id(&self) -> DefinitionId {
        DefinitionId(self.items.keys().map(|id| id.0).max().map_or(1, |max| max + 1))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Definitions in id order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let mut items: Vec<&T> = self.items.values().collect();
        items.sort_by_key(|item| item.id());
        items.into_iter()
    }
}

impl<T: Definition> Repository<T> for Registry<T> {
    fn get(&self, id: DefinitionId) -> Option<&T> {
        self.items.get(&id)
    }

    fn get_by_name(&self, name: &str) -> Option<&T> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|id| self.items.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Thing {
        id: DefinitionId,
        name: String,
    }

    impl Definition for Thing {
        const KIND: &'static str = "thing";

        fn id(&self) -> DefinitionId {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn thing(id: u32, name: &str) -> Thing {
        Thing {
            id: DefinitionId(id),
            name: name.into(),
        }
    }

    #[test]
    fn test_get_and_get_by_name() {
        let mut registry = Registry::new();
        registry.insert(thing(1, "Longsword")).unwrap();
        assert_eq!(registry.get(DefinitionId(1)).unwrap().name, "Longsword");
        assert_eq!(registry.get_by_name("longsword").unwrap().id, DefinitionId(1));
        assert!(registry.get_by_name("axe").is_none());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut registry = Registry::new();
        registry.insert(thing(1, "a")).unwrap();
        assert!(registry.insert(thing(1, "b")).is_err());
        assert!(registry.insert(thing(2, "A")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_require_reports_missing() {
        let registry: Registry<Thing> = Registry::new();
        let err = registry.require_by_name("ghost").unwrap_err();
        assert!(matches!(err, CombatError::DefinitionNotFound { kind: "thing", .. }));
    }

    #[test]
    fn test_next_id_and_order() {
        let mut registry = Registry::new();
        assert_eq!(registry.next_id(), DefinitionId(1));
        registry.insert(thing(7, "g")).unwrap();
        registry.insert(thing(3, "c")).unwrap();
        assert_eq!(registry.next_id(), DefinitionId(8));
        let ids: Vec<_> = registry.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![3, 7]);
    }
}
