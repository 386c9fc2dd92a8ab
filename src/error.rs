// SPDX-License-Identifier: MIT
//! Error types for edit-script validation and subtraction.

use thiserror::Error;

/// Error produced when validating an edit script or opcode list.
///
/// Returned only by [`check_editops`](crate::ops::check_editops) and
/// [`check_opcodes`](crate::ops::check_opcodes); application and
/// inversion assume a valid script and never report errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// An operation addresses a position outside the source or
    /// destination string, or sits at a string end with a kind that
    /// cannot occur there.
    #[error("edit operation {index} is out of bounds")]
    OutOfBounds {
        /// Index of the offending operation.
        index: usize,
    },

    /// Operations are not non-decreasing in source and destination
    /// position (elementary), or adjacent blocks do not meet exactly
    /// (opcodes).
    #[error("edit operation {index} breaks the position ordering")]
    OrderViolation {
        /// Index of the first operation out of order.
        index: usize,
    },

    /// A block's span shape does not match its kind.
    #[error("block operation {index} has an invalid span shape")]
    MalformedBlock {
        /// Index of the malformed block.
        index: usize,
    },

    /// The block list does not start at (0, 0) or does not end at the
    /// string lengths, so it cannot partition the strings.
    #[error("block operations do not cover both strings")]
    SpanMismatch,
}

impl ScriptError {
    /// Returns the index of the offending operation, if the error
    /// points at one.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::OutOfBounds { index }
            | Self::OrderViolation { index }
            | Self::MalformedBlock { index } => Some(*index),
            Self::SpanMismatch => None,
        }
    }
}

/// The operations passed to [`subtract_editops`](crate::ops::subtract_editops)
/// are not an ordered subsequence of the minuend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("subtracted operations are not a subsequence")]
pub struct SubtractError;
