//! Transform trait.

use crate::record::ScrubbedRecord;

/// Pure transformation of a scrubbed record into an output row.
///
/// Implementors must be deterministic: equal inputs give equal outputs.
pub trait Transform {
    type Output;

    fn transform(&self, record: &ScrubbedRecord) -> Self::Output;
}
