// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Errors returned by the sequence engine and the document layer.
//!
//! Remote operations routinely arrive before their dependencies, so
//! `OutOfOrder` and `MissingParent` are normal outcomes: the caller buffers
//! the op and retries once more ops have been applied.

use thiserror::Error;

use super::id::OpId;

/// Why an insert was rejected. A rejected insert leaves the sequence untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// The op is not the actor's next op: an earlier one is still missing,
    /// or this one was already applied.
    #[error("out of order insert: expected seq {expected}, found {found}")]
    OutOfOrder { expected: u64, found: u64 },
    /// An origin the op is anchored to is not in the sequence yet.
    #[error("missing parent {parent}")]
    MissingParent { parent: OpId },
}

impl InsertError {
    /// True when retrying after more ops arrive can succeed.
    ///
    /// An `OutOfOrder` insert whose seq is behind the frontier is a
    /// duplicate and will never apply.
    pub fn is_recoverable(&self) -> bool {
        return match self {
            InsertError::OutOfOrder { expected, found } => found > expected,
            InsertError::MissingParent { .. } => true,
        };
    }
}

/// Why a delete was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// No entry with this id exists (yet).
    #[error("no entry {id}")]
    NotFound { id: OpId },
    /// The entry is already a tombstone.
    #[error("entry {id} already deleted")]
    AlreadyDeleted { id: OpId },
}

impl DeleteError {
    /// True when the delete's intent already holds.
    ///
    /// Two replicas deleting the same character concurrently is expected,
    /// the second delete to arrive reports `AlreadyDeleted`.
    pub fn is_benign(&self) -> bool {
        return matches!(self, DeleteError::AlreadyDeleted { .. });
    }
}

/// Why a single op could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error(transparent)]
    Insert(#[from] InsertError),
    #[error(transparent)]
    Delete(#[from] DeleteError),
}

/// A batch stopped at its first failing op.
///
/// Ops before the failing one stay applied; `applied` says how many.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("batch stopped after {applied} applied ops: {error}")]
pub struct BatchError {
    /// Number of ops at the front of the batch that were applied.
    pub applied: usize,
    /// Why the op at index `applied` failed.
    #[source]
    pub error: ApplyError,
}

/// Error returned when parsing the text form of an id fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("actor id must be 64 hex digits, found {found} characters")]
    ActorLength { found: usize },
    #[error("invalid hex digit at position {index}")]
    ActorDigit { index: usize },
    #[error("op id must look like <seq>@<actor>")]
    MissingSeparator,
    #[error("invalid sequence number {0:?}")]
    Seq(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::id::ActorId;

    #[test]
    fn recoverable_inserts() {
        let ahead = InsertError::OutOfOrder { expected: 2, found: 5 };
        let behind = InsertError::OutOfOrder { expected: 2, found: 1 };
        let parent = InsertError::MissingParent { parent: OpId::new(ActorId::derive("a"), 0) };

        assert!(ahead.is_recoverable());
        assert!(!behind.is_recoverable());
        assert!(parent.is_recoverable());
    }

    #[test]
    fn benign_deletes() {
        let id = OpId::new(ActorId::derive("a"), 3);
        assert!(DeleteError::AlreadyDeleted { id }.is_benign());
        assert!(!DeleteError::NotFound { id }.is_benign());
    }

    #[test]
    fn batch_error_message_names_prefix() {
        let error = BatchError {
            applied: 2,
            error: InsertError::OutOfOrder { expected: 0, found: 4 }.into(),
        };
        assert_eq!(
            error.to_string(),
            "batch stopped after 2 applied ops: out of order insert: expected seq 0, found 4"
        );
    }
}
