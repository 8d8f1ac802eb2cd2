// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Error codes
//!

use thiserror::Error;

///
/// Errors produced when building or parsing regular expressions
///
/// Decision procedures on well-formed terms are total and do not
/// produce errors. Violations of internal term invariants (a recursion
/// marker escaping the procedure that created it) are bugs in the
/// library, not bad input; they panic instead of being reported here.
///
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// Repetition bounds are malformed.
    ///
    /// `repeat(m, n)` requires `0 <= m <= n`.
    #[error("invalid repetition bounds {{{0},{1}}}")]
    InvalidArgument(i64, i64),

    /// The textual surface syntax could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

///
/// Parse errors, with a byte offset into the input
///
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    /// Input ended inside an unfinished construct
    #[error("unexpected end of pattern")]
    UnexpectedEnd,

    /// A character that cannot start or continue a construct at this point
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),

    /// Unbalanced `)` or missing `)`
    #[error("unbalanced group at offset {0}")]
    UnbalancedGroup(usize),

    /// A character class `[...]` with no member
    #[error("empty character class at offset {0}")]
    EmptyClass(usize),

    /// A class range `a-b` with `b < a`
    #[error("reversed class range at offset {0}")]
    ReversedClassRange(usize),

    /// `{m,n}` with `n < m`, or a missing bound
    #[error("bad repetition at offset {0}")]
    BadRepetition(usize),

    /// A postfix operator with nothing to apply to
    #[error("dangling postfix operator {0:?} at offset {1}")]
    DanglingPostfix(char, usize),
}
