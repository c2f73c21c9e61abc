//! Read-through lookup of stored function records

use crate::storage::{FunctionData, FunctionRecord, Storage};
use crate::Result;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Function lookups backed by storage with a bounded LRU in front
///
/// Only names that resolve are cached, so a function stored after a miss is
/// found on the next call.
pub struct SymbolLookup<S: Storage> {
    storage: S,
    cache: LruCache<String, FunctionData>,
    hits: u64,
    misses: u64,
}

impl<S: Storage> SymbolLookup<S> {
    /// Creates a lookup holding at most `capacity` functions (at least one)
    pub fn new(storage: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            storage,
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, name: &str) -> Result<Option<FunctionData>> {
        if let Some(data) = self.cache.get(name) {
            self.hits += 1;
            tracing::trace!(symbol = name, "Lookup cache hit");
            return Ok(Some(data.clone()));
        }

        self.misses += 1;
        let found = self.storage.query_function(name)?;
        if let Some(data) = &found {
            self.cache.put(name.to_string(), data.clone());
        }
        Ok(found)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes a record through to storage and evicts any cached copy
    ///
    /// Storage is only reachable mutably through this method, so a cached
    /// entry never outlives a rewrite of its record.
    pub fn store_function_record(&mut self, record: &FunctionRecord) -> Result<()> {
        self.storage.store_function_record(record)?;
        if self.cache.pop(&record.declaration.name).is_some() {
            tracing::trace!(symbol = %record.declaration.name, "Evicted rewritten record");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FunctionRecord, SqliteStorage};
    use crate::symbols::{FunctionDeclaration, Parameter, ParameterBlock};

    fn record(name: &str) -> FunctionRecord {
        FunctionRecord {
            declaration: FunctionDeclaration {
                name: name.to_string(),
                return_type: "BOOL".to_string(),
                parameters: vec![Parameter {
                    usage_hint: "in".to_string(),
                    type_hint: "HANDLE".to_string(),
                    name: "h".to_string(),
                }],
            },
            parameter_docs: vec![ParameterBlock {
                name: "h".to_string(),
                fragments: vec!["<p>A handle.</p>".to_string()],
            }],
            description: "<p>Closes a handle.</p>".to_string(),
            requirements: "[]".to_string(),
        }
    }

    #[test]
    fn test_read_through_caches_found_names() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.store_function_record(&record("CloseHandle")).unwrap();
        let mut lookup = SymbolLookup::new(storage, 4);

        let first = lookup.get("CloseHandle").unwrap().unwrap();
        let second = lookup.get("CloseHandle").unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.parameters[0].documentation, "<p>A handle.</p>");
        assert_eq!(lookup.stats(), (1, 1));
        assert_eq!(lookup.cached(), 1);
    }

    #[test]
    fn test_missing_names_are_not_cached() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut lookup = SymbolLookup::new(storage, 4);

        assert!(lookup.get("CloseHandle").unwrap().is_none());
        assert_eq!(lookup.cached(), 0);

        lookup.store_function_record(&record("CloseHandle")).unwrap();
        assert!(lookup.get("CloseHandle").unwrap().is_some());
    }

    #[test]
    fn test_rewritten_record_is_not_served_stale() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.store_function_record(&record("CloseHandle")).unwrap();
        let mut lookup = SymbolLookup::new(storage, 4);
        assert_eq!(lookup.get("CloseHandle").unwrap().unwrap().return_type, "BOOL");

        let mut rewritten = record("CloseHandle");
        rewritten.declaration.return_type = "VOID".to_string();
        lookup.store_function_record(&rewritten).unwrap();

        assert_eq!(lookup.cached(), 0);
        assert_eq!(lookup.get("CloseHandle").unwrap().unwrap().return_type, "VOID");
        assert_eq!(lookup.stats(), (0, 2));
    }

    #[test]
    fn test_capacity_bounds_the_cache() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        for name in ["A", "B", "C"] {
            storage.store_function_record(&record(name)).unwrap();
        }
        let mut lookup = SymbolLookup::new(storage, 2);

        for name in ["A", "B", "C", "A"] {
            lookup.get(name).unwrap();
        }

        assert_eq!(lookup.cached(), 2);
        assert_eq!(lookup.stats(), (0, 4));
    }
}
