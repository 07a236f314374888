//! Per-event collection storage.
//!
//! Collections are typed, ordered sequences keyed by (name, pass). Producers read
//! their inputs through [`CollectionStore::get`] and publish outputs with
//! [`CollectionStore::put`], which always writes into the store's own pass.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::{RecoError, RecoResult};

/// Capability interface over an event's named collections.
pub trait CollectionStore {
    /// Pass name under which `put` publishes.
    fn pass_name(&self) -> &str;

    /// Whether a collection with this name exists; an empty `pass` matches any pass.
    fn exists(&self, name: &str, pass: &str) -> bool;

    /// Borrow a collection; an empty `pass` matches any pass as long as only one matches.
    fn get<T: Send + Sync + 'static>(&self, name: &str, pass: &str) -> RecoResult<&[T]>;

    /// Publish a collection under the store's own pass.
    fn put<T: Send + Sync + 'static>(&mut self, name: &str, items: Vec<T>) -> RecoResult<()>;
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionKey {
    pub name: String,
    pub pass: String,
}

impl CollectionKey {
    pub fn new(name: &str, pass: &str) -> Self {
        CollectionKey {
            name: name.to_string(),
            pass: pass.to_string(),
        }
    }

    /// Name matches and, unless `pass` is empty, pass matches too.
    fn matches(&self, name: &str, pass: &str) -> bool {
        self.name == name && (pass.is_empty() || self.pass == pass)
    }
}

impl Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.name, self.pass)
    }
}

/// In-memory event: the collections of a single physics event.
pub struct Event {
    pub number: u64,
    pass: String,
    collections: BTreeMap<CollectionKey, Box<dyn Any + Send + Sync>>,
}

impl Event {
    pub fn new(number: u64, pass: &str) -> Self {
        Event {
            number,
            pass: pass.to_string(),
            collections: BTreeMap::new(),
        }
    }

    /// Insert a collection under an explicit pass, e.g. inputs produced by an earlier pass.
    pub fn insert<T: Send + Sync + 'static>(&mut self, name: &str, pass: &str, items: Vec<T>) -> RecoResult<()> {
        let key = CollectionKey::new(name, pass);
        if self.collections.contains_key(&key) {
            return Err(RecoError::DuplicateCollection {
                name: name.to_string(),
                pass: pass.to_string(),
            });
        }
        self.collections.insert(key, Box::new(items));
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &CollectionKey> {
        self.collections.keys()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl CollectionStore for Event {
    fn pass_name(&self) -> &str {
        &self.pass
    }

    fn exists(&self, name: &str, pass: &str) -> bool {
        self.collections.keys().any(|k| k.matches(name, pass))
    }

    fn get<T: Send + Sync + 'static>(&self, name: &str, pass: &str) -> RecoResult<&[T]> {
        let mut found = self
            .collections
            .iter()
            .filter(|(k, _)| k.matches(name, pass))
            .map(|(_, v)| v);
        let boxed = found.next().ok_or_else(|| RecoError::missing(name, pass))?;
        if found.next().is_some() {
            return Err(RecoError::AmbiguousCollection { name: name.to_string() });
        }
        boxed
            .downcast_ref::<Vec<T>>()
            .map(|v| v.as_slice())
            .ok_or_else(|| RecoError::CollectionType {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    fn put<T: Send + Sync + 'static>(&mut self, name: &str, items: Vec<T>) -> RecoResult<()> {
        let pass = self.pass.clone();
        self.insert(name, &pass, items)
    }
}
