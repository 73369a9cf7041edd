//! Filtering traits.
use crate::audit::Rejection;

/// Outcome of a filter on a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Keep,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

/// Stateless filter: the verdict only depends on the item.
pub trait Filter<T> {
    fn detect(&self, item: T) -> Verdict;
}

/// Filter whose verdict depends on what it has already seen.
///
/// Named `detect_mut` so a type can implement both traits without ambiguity.
pub trait FilterMut<T> {
    fn detect_mut(&mut self, item: T) -> Verdict;
}
