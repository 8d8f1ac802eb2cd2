// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Extended naturals for match-size arithmetic
//!
//! A [Size] is either a finite natural number or `Unbounded` (infinity).
//! Sizes measure string lengths, so the arithmetic follows the usual
//! extended-natural rules with one refinement needed for Kleene star:
//! `0 * Unbounded = 0` (repeating the empty string any number of times
//! still produces the empty string).
//!
//! Finite sizes are stored as u64. Operations panic on arithmetic
//! overflow.
//!

use std::fmt::Display;
use std::ops::{Add, Mul};

///
/// A natural number extended with an `Unbounded` top element
///
/// The derived ordering places every finite value below `Unbounded`.
///
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum Size {
    /// A finite number of characters
    Finite(u64),
    /// Infinity
    Unbounded,
}

/// Wrapper for addition with overflow detection
fn add64(x: u64, y: u64) -> u64 {
    x.checked_add(y).expect("Arithmetic overflow (add u64)")
}

/// Wrapper for multiplication with overflow detection
fn mul64(x: u64, y: u64) -> u64 {
    x.checked_mul(y).expect("Arithmetic overflow (mul u64)")
}

impl Size {
    /// The size zero
    pub const ZERO: Size = Size::Finite(0);

    /// The size one
    pub const ONE: Size = Size::Finite(1);

    /// Check whether this size is zero
    pub fn is_zero(&self) -> bool {
        matches!(self, Size::Finite(0))
    }

    /// Check whether this size is finite
    pub fn is_finite(&self) -> bool {
        matches!(self, Size::Finite(_))
    }
}

impl From<u64> for Size {
    fn from(x: u64) -> Self {
        Size::Finite(x)
    }
}

impl From<u32> for Size {
    fn from(x: u32) -> Self {
        Size::Finite(x as u64)
    }
}

/// Addition: `Unbounded + x = x + Unbounded = Unbounded`
impl Add for Size {
    type Output = Size;

    fn add(self, other: Size) -> Size {
        match (self, other) {
            (Size::Finite(x), Size::Finite(y)) => Size::Finite(add64(x, y)),
            _ => Size::Unbounded,
        }
    }
}

/// Multiplication: `0 * Unbounded = 0` and `n * Unbounded = Unbounded` for n >= 1
impl Mul for Size {
    type Output = Size;

    fn mul(self, other: Size) -> Size {
        match (self, other) {
            (Size::Finite(0), _) | (_, Size::Finite(0)) => Size::ZERO,
            (Size::Finite(x), Size::Finite(y)) => Size::Finite(mul64(x, y)),
            _ => Size::Unbounded,
        }
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Size::Finite(x) => write!(f, "{}", x),
            Size::Unbounded => write!(f, "inf"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Size;

    fn make_examples() -> Vec<Size> {
        vec![
            Size::ZERO,
            Size::ONE,
            Size::Finite(2),
            Size::Finite(417),
            Size::Unbounded,
        ]
    }

    #[test]
    fn test_order() {
        let v = make_examples();
        for w in v.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert!(Size::Finite(u64::MAX) < Size::Unbounded);
        assert_eq!(Size::ZERO.min(Size::Unbounded), Size::ZERO);
        assert_eq!(Size::Finite(3).max(Size::Finite(9)), Size::Finite(9));
    }

    #[test]
    fn test_add() {
        for x in make_examples() {
            assert_eq!(x + Size::ZERO, x);
            assert_eq!(Size::ZERO + x, x);
            assert_eq!(x + Size::Unbounded, Size::Unbounded);
            assert_eq!(Size::Unbounded + x, Size::Unbounded);
        }
        assert_eq!(Size::Finite(2) + Size::Finite(417), Size::Finite(419));
    }

    #[test]
    fn test_mul() {
        for x in make_examples() {
            assert_eq!(x * Size::ZERO, Size::ZERO);
            assert_eq!(Size::ZERO * x, Size::ZERO);
            assert_eq!(x * Size::ONE, x);
            assert_eq!(Size::ONE * x, x);
        }
        assert_eq!(Size::Finite(2) * Size::Unbounded, Size::Unbounded);
        assert_eq!(Size::Unbounded * Size::Unbounded, Size::Unbounded);
        assert_eq!(Size::Finite(3) * Size::Finite(9), Size::Finite(27));
    }

    #[test]
    #[should_panic]
    fn test_overflow() {
        let _ = Size::Finite(u64::MAX) + Size::ONE;
    }
}
