//! Lattice operations over rule satisfaction values.
//!
//! Every operator in [`operators`](crate::operators) is written against these traits rather than
//! against `bool` directly, so the same operator trees can be evaluated over any metric that forms
//! a bounded lattice. Satisfaction of a safety rule is the two-element lattice `false < true`.

/// Trait representing a type with a global maximum.
///
/// The value returned by the `top` method should be greater than all other values in the type.
/// `ALWAYS` starts its backwards scan from this value.
pub trait Top {
    /// Compute the global maximum for the type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hearth::Top;
    /// let top = bool::top();  // true
    /// ```
    fn top() -> Self;
}

/// Trait representing a type with a global minimum.
///
/// The value returned by the `bottom` method should be less than all other values in the type.
/// `EVENTUALLY` starts its backwards scan from this value, and `NEXT` uses it past the end of a
/// trace.
pub trait Bottom {
    /// Compute the global minimum value for the type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hearth::Bottom;
    /// let bottom = bool::bottom();  // false
    /// ```
    fn bottom() -> Self;
}

/// Trait representing a type that can compute the [infimum] of two values.
///
/// For booleans this is conjunction.
///
/// [infimum]: https://en.wikipedia.org/wiki/Infimum_and_supremum
pub trait Meet: PartialOrd {
    /// This method returns the infimum of two values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hearth::Meet;
    /// let inf = Meet::min(&true, &false);  // false
    /// ```
    fn min(&self, other: &Self) -> Self;
}

/// Trait representing a type that can compute the [supremum] of two values.
///
/// For booleans this is disjunction.
///
/// [supremum]: https://en.wikipedia.org/wiki/Infimum_and_supremum
pub trait Join: PartialOrd {
    /// This method returns the supremum of two values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hearth::Join;
    /// let sup = Join::max(&true, &false);  // true
    /// ```
    fn max(&self, other: &Self) -> Self;
}

impl Top for bool {
    fn top() -> Self {
        true
    }
}

impl Bottom for bool {
    fn bottom() -> Self {
        false
    }
}

impl Meet for bool {
    fn min(&self, other: &Self) -> Self {
        *self && *other
    }
}

impl Join for bool {
    fn max(&self, other: &Self) -> Self {
        *self || *other
    }
}
