use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

/// Fixed-capacity, time-ordered history. Most recent entry is last; pushing
/// past capacity evicts the oldest entry.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundedHistory<T, const N: usize> {
    items: VecDeque<T>,
}

impl<T, const N: usize> BoundedHistory<T, N> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::with_capacity(N),
        }
    }

    /// Append an entry, returning the evicted oldest entry if the history was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == N {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

impl<T, const N: usize> Default for BoundedHistory<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> FromIterator<T> for BoundedHistory<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut history = Self::new();
        for item in iter {
            history.push(item);
        }
        history
    }
}

impl<T: Serialize, const N: usize> Serialize for BoundedHistory<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for BoundedHistory<T, N> {
    /// Oversized input keeps only the newest `N` entries.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
