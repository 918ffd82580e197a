//! Order state errors.
//!
//! Business outcomes are never errors; they are event records. These cover
//! misuse of the record types by calling code.

use std::fmt;

use super::value_objects::EventType;

/// Errors raised by checked access to a [`Txn`](super::events::Txn).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnError {
    /// The Txn holds a different kind of record.
    KindMismatch {
        /// Record shape requested.
        expected: &'static str,
        /// Kind actually held.
        actual: EventType,
    },
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch { expected, actual } => {
                write!(f, "Txn kind mismatch: expected {expected}, found {actual}")
            }
        }
    }
}

impl std::error::Error for TxnError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mismatch_display() {
        let err = TxnError::KindMismatch {
            expected: "FILL",
            actual: EventType::Ordered,
        };
        assert_eq!(err.to_string(), "Txn kind mismatch: expected FILL, found ORDERED");
    }
}
