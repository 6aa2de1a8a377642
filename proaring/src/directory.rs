//! Sorted mapping from high key to container
//!
//! Keys and containers live in two parallel vectors; lookups binary search
//! the keys.

use crate::container::Container;
use std::iter::Zip;
use std::slice;

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Directory {
    keys: Vec<u64>,
    containers: Vec<Container>,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            containers: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            containers: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn position(&self, key: u64) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    /// Return the container for `key`, inserting an empty array container if absent
    pub fn get_or_create(&mut self, key: u64) -> &mut Container {
        let index = match self.position(key) {
            Ok(index) => index,
            Err(index) => {
                self.keys.insert(index, key);
                self.containers.insert(index, Container::new());
                index
            }
        };
        &mut self.containers[index]
    }

    /// Store `container` under `key`, replacing any existing container
    pub fn put(&mut self, key: u64, container: Container) {
        match self.position(key) {
            Ok(index) => self.containers[index] = container,
            Err(index) => {
                self.keys.insert(index, key);
                self.containers.insert(index, container);
            }
        }
    }

    /// Append a container whose key is greater than every key present.
    ///
    /// Returns the container back if the key would break the ordering.
    pub(crate) fn push(&mut self, key: u64, container: Container) -> Result<(), Container> {
        if self.keys.last().is_some_and(|&last| last >= key) {
            return Err(container);
        }
        self.keys.push(key);
        self.containers.push(container);
        Ok(())
    }

    #[inline]
    pub fn get(&self, key: u64) -> Option<&Container> {
        self.position(key).ok().map(|index| &self.containers[index])
    }

    #[inline]
    pub fn get_mut(&mut self, key: u64) -> Option<&mut Container> {
        match self.position(key) {
            Ok(index) => Some(&mut self.containers[index]),
            Err(_) => None,
        }
    }

    pub fn remove(&mut self, key: u64) -> Option<Container> {
        let index = self.position(key).ok()?;
        self.keys.remove(index);
        Some(self.containers.remove(index))
    }

    /// Keys in ascending order
    pub fn keys(&self) -> std::iter::Copied<slice::Iter<'_, u64>> {
        self.keys.iter().copied()
    }

    pub fn iter(&self) -> Zip<slice::Iter<'_, u64>, slice::Iter<'_, Container>> {
        self.keys.iter().zip(self.containers.iter())
    }

    #[inline]
    pub fn as_slices(&self) -> (&[u64], &[Container]) {
        (&self.keys, &self.containers)
    }

    pub fn containers_mut(&mut self) -> slice::IterMut<'_, Container> {
        self.containers.iter_mut()
    }

    /// Drop every empty container
    pub fn prune(&mut self) {
        // retain visits elements in order, exactly once
        let mut occupied = self.containers.iter().map(|c| !c.is_empty());
        self.keys.retain(|_| occupied.next().unwrap_or(false));
        self.containers.retain(|c| !c.is_empty());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.containers.clear();
    }

    pub fn last(&self) -> Option<(u64, &Container)> {
        Some((*self.keys.last()?, self.containers.last()?))
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.keys.len() != self.containers.len() {
            return Err("key and container counts differ");
        }
        if !self.keys.windows(2).all(|w| w[0] < w[1]) {
            return Err("keys are not strictly ascending");
        }
        self.containers.iter().try_for_each(Container::validate)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::container::Encoding;

    #[test]
    fn get_or_create_keeps_keys_sorted() {
        let mut directory = Directory::new();
        for key in [5, 1, 9, 1, u64::MAX >> 16, 0] {
            directory.get_or_create(key).add(key as u16);
        }
        assert_eq!(directory.keys().collect::<Vec<_>>(), [0, 1, 5, 9, u64::MAX >> 16]);
        assert_eq!(directory.len(), 5);
        directory.validate().unwrap();
    }

    #[test]
    fn put_replaces_existing() {
        let mut directory = Directory::new();
        directory.get_or_create(3).add(1);
        let mut replacement = Container::new();
        for low in 0..5000 {
            replacement.add(low);
        }
        directory.put(3, replacement);
        assert_eq!(directory.len(), 1);
        let container = directory.get(3).unwrap();
        assert_eq!(container.encoding(), Encoding::Bitmap);
        assert_eq!(container.cardinality(), 5000);
        assert!(directory.get(4).is_none());
    }

    #[test]
    fn push_rejects_out_of_order_keys() {
        let mut directory = Directory::new();
        assert!(directory.push(2, Container::new()).is_ok());
        assert!(directory.push(2, Container::new()).is_err());
        assert!(directory.push(1, Container::new()).is_err());
        assert!(directory.push(3, Container::new()).is_ok());
        assert_eq!(directory.keys().collect::<Vec<_>>(), [2, 3]);
    }

    #[test]
    fn prune_drops_empty_containers() {
        let mut directory = Directory::new();
        directory.get_or_create(1).add(1);
        directory.get_or_create(2);
        directory.get_or_create(3).add(3);
        directory.prune();
        assert_eq!(directory.keys().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(directory.remove(1).map(|c| c.cardinality()), Some(1));
        assert_eq!(directory.remove(1), None);
    }
}
