//! Resource identifier validation.
//!
//! Identifiers in the content and user stores are ULIDs. Validation here is
//! purely syntactic; existence is the caller's concern.

use ulid::Ulid;

/// The id value(s) a gate invocation is asked to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSelector {
    Single(String),
    Batch(Vec<String>),
}

impl From<&str> for IdSelector {
    fn from(id: &str) -> Self {
        IdSelector::Single(id.to_string())
    }
}

impl From<String> for IdSelector {
    fn from(id: String) -> Self {
        IdSelector::Single(id)
    }
}

impl From<Vec<String>> for IdSelector {
    fn from(ids: Vec<String>) -> Self {
        IdSelector::Batch(ids)
    }
}

impl From<&[String]> for IdSelector {
    fn from(ids: &[String]) -> Self {
        IdSelector::Batch(ids.to_vec())
    }
}

/// Why an identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdProblem {
    /// No id, an empty single id, or an empty batch.
    Missing,
    /// A single non-empty id that is not well formed.
    Malformed,
    /// At least one batch member is empty or malformed.
    MalformedInBatch,
}

/// True if `id` is a well-formed resource identifier.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && Ulid::from_string(id).is_ok()
}

/// Validates an optional selector. Any failing member fails the whole set.
pub fn check_ids(ids: Option<&IdSelector>) -> Result<(), IdProblem> {
    match ids {
        None => Err(IdProblem::Missing),
        Some(IdSelector::Single(id)) if id.is_empty() => Err(IdProblem::Missing),
        Some(IdSelector::Single(id)) if !is_valid_id(id) => Err(IdProblem::Malformed),
        Some(IdSelector::Single(_)) => Ok(()),
        Some(IdSelector::Batch(ids)) if ids.is_empty() => Err(IdProblem::Missing),
        Some(IdSelector::Batch(ids)) => {
            if ids.iter().all(|id| is_valid_id(id)) {
                Ok(())
            } else {
                Err(IdProblem::MalformedInBatch)
            }
        }
    }
}
