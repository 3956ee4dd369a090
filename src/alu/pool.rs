//! Bounded append-only resource pools.

use crate::core::error::{AluError, PoolKind};

/// A fixed-capacity, append-only list of entries.
///
/// Pushing past capacity is a checked capacity error naming the pool.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    kind: PoolKind,
    capacity: usize,
    entries: Vec<T>,
}

impl<T> Pool<T> {
    pub fn new(kind: PoolKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Append `entry`, returning its slot index.
    pub fn try_push(&mut self, entry: T) -> Result<usize, AluError> {
        if self.is_full() {
            return Err(self.exhausted());
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// The capacity error for this pool.
    pub fn exhausted(&self) -> AluError {
        AluError::PoolExhausted {
            pool: self.kind,
            capacity: self.capacity,
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.entries.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.entries
    }

    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.entries.iter().position(predicate)
    }
}

impl<T: PartialEq> Pool<T> {
    pub fn contains(&self, entry: &T) -> bool {
        self.entries.contains(entry)
    }
}

impl<'a, T> IntoIterator for &'a Pool<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut pool = Pool::new(PoolKind::BranchRegisters, 2);
        assert_eq!(pool.try_push('a').unwrap(), 0);
        assert_eq!(pool.try_push('b').unwrap(), 1);
        assert!(pool.is_full());

        let err = pool.try_push('c').unwrap_err();
        assert_eq!(
            err,
            AluError::PoolExhausted {
                pool: PoolKind::BranchRegisters,
                capacity: 2
            }
        );
        assert_eq!(pool.as_slice(), &['a', 'b']);
    }

    #[test]
    fn test_lookup() {
        let mut pool = Pool::new(PoolKind::WordInputs, 13);
        pool.try_push(7).unwrap();
        pool.try_push(9).unwrap();
        assert_eq!(pool.position(|&v| v == 9), Some(1));
        assert!(pool.contains(&7));
        assert_eq!(pool.get(2), None);
    }
}
