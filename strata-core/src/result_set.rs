use std::{ops::Index, ptr, slice, vec};

/// Ordered hydrated rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedResultSet<T> {
    items: Vec<T>,
}

impl<T> Default for MaterializedResultSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> MaterializedResultSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn reverse(mut self) -> Self {
        self.items.reverse();
        self
    }
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }
    /// Slot of this set holding exactly `item` (same address, not just equal).
    pub fn position_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|v| ptr::eq(v, item))
    }
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Index<usize> for MaterializedResultSet<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IntoIterator for MaterializedResultSet<T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a MaterializedResultSet<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for MaterializedResultSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MaterializedResultSet;

    #[test]
    fn position_is_by_identity() {
        let set: MaterializedResultSet<_> = [1, 1, 2].into_iter().collect();
        assert_eq!(set.position_of(&set[1]), Some(1));
        assert_eq!(set.position_of(&1), None);
        let reversed = set.clone().reverse();
        assert_eq!(reversed.into_vec(), vec![2, 1, 1]);
        assert_eq!(set.len(), 3);
    }
}
