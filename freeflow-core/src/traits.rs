//! Core traits
//!
//! Kept deliberately small: the estimators are concrete types and only the
//! finiteness check is shared across the crate.

/// Trait for values that can be checked before they reach a filter
pub trait Validatable {
    /// Check if the value is usable (not NaN, not infinite)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl<T: Validatable> Validatable for [T] {
    fn is_valid(&self) -> bool {
        self.iter().all(Validatable::is_valid)
    }
}

impl<T: Validatable, const N: usize> Validatable for [T; N] {
    fn is_valid(&self) -> bool {
        self.as_slice().is_valid()
    }
}
