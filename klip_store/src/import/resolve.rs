//! Find-or-create with an in-run name cache.

use std::{collections::HashMap, hash::Hash};

/// How a [`NameCache`] treats its own entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// A cached id is returned without touching the store.
    #[default]
    TrustCache,
    /// Every resolution asks the store first; the cache only records ids.
    AlwaysLookup,
}

/// Outcome of [`NameCache::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Id of the found or created row.
    pub id: i32,
    /// Whether the row was created by this call.
    pub created: bool,
}

/// Key → id cache in front of a store's find/create pair.
#[derive(Debug, Clone)]
pub struct NameCache<K> {
    policy: CachePolicy,
    entries: HashMap<K, i32>,
}

impl<K: Eq + Hash> NameCache<K> {
    /// Empty cache.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    /// Cached id for `key`, if any.
    pub fn get(&self, key: &K) -> Option<i32> {
        self.entries.get(key).copied()
    }

    /// Cache, then `find`, then `create`. The id is cached whichever step produced it.
    pub fn resolve<S: ?Sized>(
        &mut self,
        store: &mut S,
        key: K,
        find: impl FnOnce(&mut S) -> anyhow::Result<Option<i32>>,
        create: impl FnOnce(&mut S) -> anyhow::Result<i32>,
    ) -> anyhow::Result<Resolved> {
        if let (CachePolicy::TrustCache, Some(id)) = (self.policy, self.get(&key)) {
            return Ok(Resolved { id, created: false });
        }

        let resolved = match find(store)? {
            Some(id) => Resolved { id, created: false },
            None => Resolved {
                id: create(store)?,
                created: true,
            },
        };
        self.entries.insert(key, resolved.id);
        Ok(resolved)
    }
}
