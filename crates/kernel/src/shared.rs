use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle to a reference-counted record in a [`SharedPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SharedHandle(pub u32);

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    references: u32,
}

/// Registry of sub-records shared between items (materials, animations,
/// move descriptors).
///
/// A record is dropped only when its last reference is released.
#[derive(Debug, Clone)]
pub struct SharedPool<T> {
    entries: BTreeMap<SharedHandle, Entry<T>>,
    next: u32,
}

impl<T> Default for SharedPool<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 1,
        }
    }
}

impl<T> SharedPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record with a single reference.
    pub fn insert(&mut self, value: T) -> SharedHandle {
        let handle = SharedHandle(self.next);
        self.next = self.next.wrapping_add(1).max(1);
        self.entries.insert(
            handle,
            Entry {
                value,
                references: 1,
            },
        );
        handle
    }

    /// Add a reference. Returns false if the handle is unknown.
    pub fn retain(&mut self, handle: SharedHandle) -> bool {
        match self.entries.get_mut(&handle) {
            Some(entry) => {
                entry.references += 1;
                true
            }
            None => false,
        }
    }

    /// Drop a reference, returning the record if this was the last one.
    pub fn release(&mut self, handle: SharedHandle) -> Option<T> {
        let entry = self.entries.get_mut(&handle)?;
        entry.references -= 1;
        if entry.references == 0 {
            self.entries.remove(&handle).map(|e| e.value)
        } else {
            None
        }
    }

    pub fn get(&self, handle: SharedHandle) -> Option<&T> {
        self.entries.get(&handle).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, handle: SharedHandle) -> Option<&mut T> {
        self.entries.get_mut(&handle).map(|e| &mut e.value)
    }

    pub fn references(&self, handle: SharedHandle) -> u32 {
        self.entries.get(&handle).map_or(0, |e| e.references)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
