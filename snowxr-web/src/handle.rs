use std::collections::HashMap;
use std::marker::PhantomData;

/// Opaque, typed handle into a [`HandleStore`]. Handles are never reused, so a
/// handle to a removed item stays dead instead of aliasing a newer one.
pub struct Handle<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

/// Store mapping opaque handles to values.
pub struct HandleStore<T> {
    items: HashMap<u64, T>,
    next: u64,
}

impl<T> HandleStore<T> {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next: 1,
        }
    }

    /// Insert an item and return its handle.
    pub fn insert(&mut self, item: T) -> Handle<T> {
        let id = self.next;
        self.next += 1;
        self.items.insert(id, item);
        Handle {
            id,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(&handle.id)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(&handle.id)
    }

    /// Remove and return the item.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        self.items.remove(&handle.id)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.items.contains_key(&handle.id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut store = HandleStore::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert_ne!(a, b);
        assert_eq!(store.get(a), Some(&"a"));
        assert_eq!(store.remove(a), Some("a"));
        assert!(store.get(a).is_none());
        assert_eq!(store.len(), 1);
        assert!(store.contains(b));
    }

    #[test]
    fn test_handles_not_reused() {
        let mut store = HandleStore::new();
        let a = store.insert(1);
        store.remove(a);
        let b = store.insert(2);
        assert_ne!(a, b);
        assert!(store.get(a).is_none());
    }
}
