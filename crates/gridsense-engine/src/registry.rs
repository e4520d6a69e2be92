//! Pattern registry for storing compiled pattern definitions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gridsense_core::{PatternDefinition, PatternId};
use thiserror::Error;

/// Registration rejected because the id is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Pattern already registered: {id}")]
pub struct DuplicateIdError {
    /// The conflicting pattern id
    pub id: PatternId,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Patterns keyed by registration sequence number
    patterns: BTreeMap<u64, Arc<PatternDefinition>>,
    /// Sequence number of each registered id
    sequence_by_id: HashMap<PatternId, u64>,
    next_sequence: u64,
}

/// Append/lookup store of compiled patterns.
///
/// Writes are serialized behind a read-write lock; reads may run
/// concurrently with each other and with matching. Iteration order is
/// registration order, which stays stable across unregistration.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    inner: RwLock<RegistryInner>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a pattern.
    ///
    /// Fails if the id already exists; the existing pattern is kept and the
    /// caller must [`unregister`](Self::unregister) it first.
    pub fn register(&self, pattern: PatternDefinition) -> Result<(), DuplicateIdError> {
        let mut inner = self.write();
        if inner.sequence_by_id.contains_key(&pattern.id) {
            return Err(DuplicateIdError { id: pattern.id });
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.sequence_by_id.insert(pattern.id.clone(), sequence);

        tracing::debug!(
            pattern_id = %pattern.id,
            component_type = %pattern.component_type,
            rules = pattern.rules.len(),
            "registered pattern"
        );
        inner.patterns.insert(sequence, Arc::new(pattern));
        Ok(())
    }

    /// Get a pattern by id.
    pub fn get(&self, id: &str) -> Option<Arc<PatternDefinition>> {
        let inner = self.read();
        let sequence = inner.sequence_by_id.get(id)?;
        inner.patterns.get(sequence).cloned()
    }

    /// All patterns in registration order.
    pub fn all(&self) -> Vec<Arc<PatternDefinition>> {
        self.read().patterns.values().cloned().collect()
    }

    /// Patterns recognizing a component type, in registration order.
    pub fn by_type(&self, component_type: &str) -> Vec<Arc<PatternDefinition>> {
        self.read()
            .patterns
            .values()
            .filter(|p| p.component_type == component_type)
            .cloned()
            .collect()
    }

    /// Remove a pattern, returning it if it was registered.
    pub fn unregister(&self, id: &str) -> Option<Arc<PatternDefinition>> {
        let mut inner = self.write();
        let sequence = inner.sequence_by_id.remove(id)?;
        let removed = inner.patterns.remove(&sequence);
        if removed.is_some() {
            tracing::debug!(pattern_id = %id, "unregistered pattern");
        }
        removed
    }

    /// Check whether an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.read().sequence_by_id.contains_key(id)
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.read().patterns.len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().patterns.is_empty()
    }

    /// Immutable, ordered view of the current contents.
    ///
    /// The lock is held only while the snapshot is taken.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            patterns: self.read().patterns.values().cloned().collect(),
        }
    }
}

/// Immutable view of a registry, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    patterns: Arc<[Arc<PatternDefinition>]>,
}

impl RegistrySnapshot {
    /// Patterns in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PatternDefinition>> {
        self.patterns.iter()
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
