/// First-seen-order ID assignment shared by the word and key tables.

use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use thiserror::Error;

use crate::schema::layout::MAX_IDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ID space exhausted after {limit} entries")]
pub struct CapacityExceeded {
    pub limit: usize,
}

/// Assigns dense IDs starting at 0, in the order values are first seen.
/// IDs are never reused and values are never removed.
#[derive(Debug, Clone)]
pub struct Interner<T> {
    ids: FxHashMap<T, u16>,
    items: Vec<T>,
    limit: usize,
}

impl<T: Hash + Eq + Clone> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> Interner<T> {
    /// An interner bounded by the 16-bit ID space.
    pub fn new() -> Self {
        Self::with_limit(MAX_IDS)
    }

    /// An interner holding at most `limit` values (capped at the 16-bit ID space).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            ids: FxHashMap::default(),
            items: Vec::new(),
            limit: limit.min(MAX_IDS),
        }
    }

    /// Return the ID of `item`, assigning the next one if it is new.
    pub fn intern<Q>(&mut self, item: &Q) -> Result<u16, CapacityExceeded>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = T> + ?Sized,
    {
        if let Some(&id) = self.ids.get(item) {
            return Ok(id);
        }
        if self.items.len() >= self.limit {
            return Err(CapacityExceeded { limit: self.limit });
        }

        let id = self.items.len() as u16;
        let owned = item.to_owned();
        self.ids.insert(owned.clone(), id);
        self.items.push(owned);
        Ok(id)
    }

    pub fn get<Q>(&self, item: &Q) -> Option<u16>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ids.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values in ID order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
