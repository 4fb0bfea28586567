//! Values indexed by their position in a trace.
//!
//! A [`Timeline`] is the output of evaluating a formula: it associates each state index of a
//! [`Trace`](crate::Trace) with the metric computed for that state. Operators consume the timelines
//! of their sub-formulas and produce new ones, so the type mostly exposes iteration in both
//! directions.
//!
//! ```rust
//! use hearth::Timeline;
//!
//! let timeline = Timeline::from([
//!     (0, true),
//!     (1, false),
//!     (2, true),
//! ]);
//!
//! timeline.at(1);  // Some(&false)
//! timeline.at(3);  // None
//! timeline[2];     // true
//! ```

use std::collections::BTreeMap;
use std::ops::{Index, RangeBounds};

/// A set of values where each value is associated with a state index.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Timeline<T>(BTreeMap<usize, T>);

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(usize, T)> for Timeline<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (usize, T)>,
    {
        Self(BTreeMap::from_iter(iter))
    }
}

impl<T, const N: usize> From<[(usize, T); N]> for Timeline<T> {
    #[inline]
    fn from(values: [(usize, T); N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T> From<Vec<(usize, T)>> for Timeline<T> {
    #[inline]
    fn from(values: Vec<(usize, T)>) -> Self {
        Self::from_iter(values)
    }
}

impl<T> Index<usize> for Timeline<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.0.index(&index)
    }
}

impl<T> Timeline<T> {
    /// Create a new empty timeline. Equivalent to [`Timeline::default()`]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Number of elements in the timeline
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the value for a given position. Returns None if the position is not present.
    pub fn at(&self, position: usize) -> Option<&T> {
        self.0.get(&position)
    }

    /// Insert a value for a given position. Returns the prior value if it exists.
    pub fn insert(&mut self, position: usize, value: T) -> Option<T> {
        self.0.insert(position, value)
    }

    /// The earliest position whose value satisfies the given predicate.
    pub fn find_position<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.0
            .iter()
            .find(|(_, value)| predicate(value))
            .map(|(&position, _)| position)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self.0.iter())
    }

    /// Iterate over the values whose positions fall within the given bounds.
    pub fn range<R>(&self, bounds: R) -> Range<'_, T>
    where
        R: RangeBounds<usize>,
    {
        Range(self.0.range(bounds))
    }
}

/// Iterator adapter that transforms each value while keeping its position.
pub struct MapStates<I, F> {
    iter: I,
    f: F,
}

impl<I, F, T, U> Iterator for MapStates<I, F>
where
    I: Iterator<Item = (usize, T)>,
    F: FnMut(T) -> U,
{
    type Item = (usize, U);

    fn next(&mut self) -> Option<Self::Item> {
        let (position, value) = self.iter.next()?;
        Some((position, (self.f)(value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<I, F, T, U> DoubleEndedIterator for MapStates<I, F>
where
    I: DoubleEndedIterator<Item = (usize, T)>,
    F: FnMut(T) -> U,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let (position, value) = self.iter.next_back()?;
        Some((position, (self.f)(value)))
    }
}

impl<I, F, T, U> ExactSizeIterator for MapStates<I, F>
where
    I: ExactSizeIterator<Item = (usize, T)>,
    F: FnMut(T) -> U,
{
    fn len(&self) -> usize {
        self.iter.len()
    }
}

/// Borrowing iterator over the (position, value) pairs in a timeline.
pub struct Iter<'a, T>(std::collections::btree_map::Iter<'a, usize, T>);

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(&position, value)| (position, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(&position, value)| (position, value))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a, T> IntoIterator for &'a Timeline<T> {
    type Item = (usize, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over the (position, value) pairs in a timeline.
pub struct IntoIter<T>(std::collections::btree_map::IntoIter<usize, T>);

impl<T> IntoIter<T> {
    /// Transform every value of the iterator, keeping its position.
    pub fn map_states<F, U>(self, f: F) -> MapStates<Self, F>
    where
        F: FnMut(T) -> U,
    {
        MapStates { iter: self, f }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = (usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<T> IntoIterator for Timeline<T> {
    type Item = (usize, T);
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.0.into_iter())
    }
}

/// Borrowing iterator over a bounded section of a timeline.
pub struct Range<'a, T>(std::collections::btree_map::Range<'a, usize, T>);

impl<'a, T> Iterator for Range<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(&position, value)| (position, value))
    }
}

impl<'a, T> DoubleEndedIterator for Range<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(&position, value)| (position, value))
    }
}

#[cfg(test)]
mod tests {
    use super::Timeline;

    #[test]
    fn get_element() {
        let timeline = Timeline::from_iter((0..10).zip([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));

        assert_eq!(timeline.at(3), Some(&4));
        assert_eq!(timeline.at(10), None);
        assert_eq!(timeline[9], 10);
    }

    #[test]
    fn select_range() {
        let timeline = Timeline::from_iter((0..10).zip([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
        let positions: Vec<usize> = timeline.range(0..4).map(|(position, _)| position).collect();
        let values: Vec<i32> = timeline.range(0..4).map(|(_, value)| *value).collect();

        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(values, vec![1, 2, 3, 4]);
    }

    #[test]
    fn find_first_failure() {
        let timeline = Timeline::from([(0, true), (1, true), (2, false), (3, false)]);

        assert_eq!(timeline.find_position(|holds| !holds), Some(2));
        assert_eq!(Timeline::from([(0, true), (1, true)]).find_position(|holds| !holds), None);
    }

    #[test]
    fn map_values_in_reverse() {
        let timeline = Timeline::from([(0, 1), (1, 2), (2, 3)]);
        let reversed: Vec<(usize, i32)> =
            timeline.into_iter().map_states(|v| v * 10).rev().collect();

        assert_eq!(reversed, vec![(2, 30), (1, 20), (0, 10)]);
    }
}
