// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Regular expressions as language values
//!
//! This module is the convenience surface of the crate: free constructors,
//! operator overloads, and decision methods that all talk to one manager.
//! The alphabet is the set of u32 between 0 and 0x10FFFF.
//!
//! Operators build languages:
//!
//! ```
//! use rx_algebra::algebra::*;
//!
//! let r = letter('a') + letter('b'); // union
//! let s = letter('a') * letter('b'); // concatenation
//!
//! assert!(r.accepts("a"));
//! assert!(s.accepts("ab"));
//! assert!((r & s).is_empty());
//! ```
//!
//! Decision methods answer semantic questions: [Rx::equiv],
//! [Rx::partial_compare], [Rx::subset_of], [Rx::accepts].
//!

use std::cell::RefCell;
use std::cmp::Ordering;
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Not, Sub};

use crate::errors::Error;
use crate::letter_sets::LetterSet;
use crate::parser;
use crate::terms::{Lang, Rx, RxManager};

//
// Lang and RxManager are not thread safe (terms carry Rc attributes).
// We keep a reference to a global RxManager as a thread-local object.
//
thread_local!(static MANAGER: RefCell<RxManager> = RefCell::new(RxManager::new()));

/// Run f with this thread's manager
fn with<R>(f: impl FnOnce(&mut RxManager) -> R) -> R {
    MANAGER.with(|m| f(&mut m.borrow_mut()))
}

///
/// The empty language
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(empty().rejects("0129"));
/// assert!(empty().rejects(""));
/// ```
pub fn empty() -> Lang {
    with(|m| m.empty())
}

///
/// The language that contains only the empty string
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(epsilon().accepts(""));
/// assert!(epsilon().rejects("a"));
/// ```
pub fn epsilon() -> Lang {
    with(|m| m.epsilon())
}

///
/// All one-character strings
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(dot().accepts("a"));
/// assert!(dot().rejects("ab"));
/// ```
pub fn dot() -> Lang {
    with(|m| m.dot())
}

///
/// The language of all strings
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(universe().accepts(""));
/// assert!(universe().accepts("anything at all"));
/// ```
pub fn universe() -> Lang {
    with(|m| m.universe())
}

///
/// The language of a single one-character string
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(letter('Z').accepts("Z"));
/// assert!(letter('Z').rejects("z"));
/// ```
pub fn letter(c: char) -> Lang {
    with(|m| m.letter(c as u32))
}

///
/// One-character strings in a character range
///
/// # Panics
///
/// If lo > hi.
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(range('0', '9').accepts("4"));
/// assert!(range('0', '9').rejects("a"));
/// ```
pub fn range(lo: char, hi: char) -> Lang {
    with(|m| m.range(lo as u32, hi as u32))
}

///
/// One-character strings over a letter set
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
/// use rx_algebra::letter_sets::LetterSet;
///
/// let vowels = LetterSet::singleton('a' as u32)
///     .union(&LetterSet::singleton('e' as u32));
/// assert!(letters(&vowels).accepts("e"));
/// assert!(letters(&vowels).rejects("b"));
/// ```
pub fn letters(set: &LetterSet) -> Lang {
    with(|m| m.letters(set.clone()))
}

///
/// The language that contains string s and nothing else
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
///
/// assert!(literal("alpha").accepts("alpha"));
/// assert!(literal("alpha").rejects("beta"));
/// ```
pub fn literal(s: &str) -> Lang {
    with(|m| m.literal(s))
}

///
/// Parse a textual pattern
///
/// # Errors
///
/// Return [Error::Parse] if the pattern is malformed.
///
/// # Example
/// ```
/// use rx_algebra::algebra::*;
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let e = parse("a(b|c)*")?;
///
/// assert!(e.accepts("abcbc"));
/// assert!(e.rejects("bc"));
/// # Ok(())
/// # }
/// ```
pub fn parse(pattern: &str) -> Result<Lang, Error> {
    with(|m| parser::parse(m, pattern))
}

impl Rx {
    /// Kleene star closure
    pub fn star(&'static self) -> Lang {
        with(|m| m.star(self))
    }

    /// One or more copies
    pub fn plus(&'static self) -> Lang {
        with(|m| m.plus(self))
    }

    /// Zero or one copy
    pub fn opt(&'static self) -> Lang {
        with(|m| m.opt(self))
    }

    /// Exactly k copies; a non-positive k gives the empty string
    ///
    /// # Example
    /// ```
    /// use rx_algebra::algebra::*;
    ///
    /// let e = letter('a').pow(3);
    /// assert!(e.accepts("aaa"));
    /// assert!(e.rejects("aa"));
    /// assert!(letter('a').pow(-2).accepts(""));
    /// ```
    pub fn pow(&'static self, k: i64) -> Lang {
        with(|m| m.pow(self, k))
    }

    /// Between m and n copies
    ///
    /// # Errors
    ///
    /// Return [Error::InvalidArgument] unless 0 <= m <= n.
    pub fn repeat(&'static self, m: i64, n: i64) -> Result<Lang, Error> {
        with(|mm| mm.repeat(self, m, n))
    }

    /// Complement with respect to the universe
    ///
    /// # Example
    /// ```
    /// use rx_algebra::algebra::*;
    ///
    /// let c = letter('a').star().complement();
    /// assert!(c.accepts("b"));
    /// assert!(c.rejects("aa"));
    /// ```
    pub fn complement(&'static self) -> Lang {
        with(|m| m.complement(self))
    }

    /// Canonical representative: equivalent terms rebuild identically
    pub fn canonical(&'static self) -> Lang {
        with(|m| m.canonical(self))
    }

    /// Check whether s belongs to this language
    pub fn accepts(&'static self, s: &str) -> bool {
        with(|m| m.accepts(self, s))
    }

    /// Check whether s does not belong to this language
    pub fn rejects(&'static self, s: &str) -> bool {
        !self.accepts(s)
    }

    /// Decide language equality
    ///
    /// # Example
    /// ```
    /// use rx_algebra::algebra::*;
    /// # use std::error::Error;
    /// #
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let r = parse("a*")?;
    /// let s = parse("(aa)*|(aa)*a")?;
    /// assert!(r.equiv(s));
    /// # Ok(())
    /// # }
    /// ```
    pub fn equiv(&'static self, other: Lang) -> bool {
        with(|m| m.equiv(self, other))
    }

    /// Compare two languages by containment
    ///
    /// `Some(Less)` means this language is contained in the other,
    /// `Some(Greater)` the converse, `Some(Equal)` equality, and `None`
    /// that neither contains the other.
    ///
    /// # Example
    /// ```
    /// use std::cmp::Ordering;
    /// use rx_algebra::algebra::*;
    /// # use std::error::Error;
    /// #
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let narrow = parse("a*")?;
    /// let wide = parse("(a|b)*")?;
    /// assert_eq!(narrow.partial_compare(wide), Some(Ordering::Less));
    ///
    /// let left = parse("a*b*")?;
    /// let right = parse("b*a*")?;
    /// assert_eq!(left.partial_compare(right), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn partial_compare(&'static self, other: Lang) -> Option<Ordering> {
        with(|m| m.partial_compare(self, other))
    }

    /// Check whether this language is contained in the other
    pub fn subset_of(&'static self, other: Lang) -> bool {
        matches!(
            self.partial_compare(other),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }

    /// Check whether this language contains the other
    pub fn superset_of(&'static self, other: Lang) -> bool {
        matches!(
            self.partial_compare(other),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )
    }

    /// Check for strict containment in the other language
    pub fn proper_subset_of(&'static self, other: Lang) -> bool {
        self.partial_compare(other) == Some(Ordering::Less)
    }

    /// Check for strict containment of the other language
    pub fn proper_superset_of(&'static self, other: Lang) -> bool {
        self.partial_compare(other) == Some(Ordering::Greater)
    }

    /// Derivative with respect to one character
    pub fn derivative(&'static self, c: char) -> Lang {
        with(|m| m.deriv(self, c as u32))
    }

    /// Derivative with respect to a string
    pub fn word_derivative(&'static self, s: &str) -> Lang {
        with(|m| m.word_derivative(self, s))
    }
}

/// Union of languages
impl Add for Lang {
    type Output = Lang;

    fn add(self, rhs: Lang) -> Lang {
        with(|m| m.choice(self, rhs))
    }
}

/// Union of languages (same as `+`)
impl BitOr for Lang {
    type Output = Lang;

    fn bitor(self, rhs: Lang) -> Lang {
        with(|m| m.choice(self, rhs))
    }
}

/// Concatenation of languages
impl Mul for Lang {
    type Output = Lang;

    fn mul(self, rhs: Lang) -> Lang {
        with(|m| m.concat(self, rhs))
    }
}

/// Intersection of languages
impl BitAnd for Lang {
    type Output = Lang;

    fn bitand(self, rhs: Lang) -> Lang {
        with(|m| m.inter(self, rhs))
    }
}

/// Difference of languages
impl Sub for Lang {
    type Output = Lang;

    fn sub(self, rhs: Lang) -> Lang {
        with(|m| m.diff(self, rhs))
    }
}

/// Symmetric difference of languages
impl BitXor for Lang {
    type Output = Lang;

    fn bitxor(self, rhs: Lang) -> Lang {
        with(|m| m.xor(self, rhs))
    }
}

/// Complement of a language
impl Not for Lang {
    type Output = Lang;

    fn not(self) -> Lang {
        with(|m| m.complement(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::Size;

    #[test]
    fn construction() {
        assert!(empty().rejects(""));
        assert!(epsilon().accepts(""));
        assert!(dot().accepts("x"));
        assert!(dot().rejects(""));
        assert!(universe().accepts(""));
        assert!(universe().accepts("abc"));
        assert!(literal("abc").accepts("abc"));
        assert!(range('a', 'f').accepts("c"));
    }

    #[test]
    fn operator_smoke() {
        let a = letter('a');
        let b = letter('b');

        assert!((a + b).accepts("a"));
        assert!((a | b).accepts("b"));
        assert!((a * b).accepts("ab"));
        assert!((a * b).rejects("ba"));
        assert!((a & b).is_empty());
        assert!((a - b).accepts("a"));
        assert!((a ^ b).equiv(a + b));
        assert!((!a).accepts("b"));
        assert!((!a).rejects("a"));
    }

    #[test]
    fn end_to_end_scenarios() {
        // a* is equivalent to (aa)* | (aa)*a and canonicalizes identically
        let r = parse("a*").unwrap();
        let s = parse("(aa)*|(aa)*a").unwrap();
        assert!(r.equiv(s));
        assert!(std::ptr::eq(r.canonical(), s.canonical()));

        // range algebra
        let r = parse("[a-c]").unwrap();
        let s = parse("[b-d]").unwrap();
        let i = r & s;
        assert!(i.accepts("b") && i.accepts("c"));
        assert!(i.rejects("a") && i.rejects("d"));
        let d = r - s;
        assert!(d.accepts("a") && d.rejects("b"));
        let x = r ^ s;
        assert!(x.accepts("a") && x.accepts("d"));
        assert!(x.rejects("b") && x.rejects("c"));

        // membership and sizes of ab*
        let r = parse("ab*").unwrap();
        assert!(r.accepts("a"));
        assert!(r.accepts("abbbb"));
        assert!(r.rejects(""));
        assert!(r.rejects("b"));
        assert_eq!(r.match_sizes(), Some((Size::ONE, Size::Unbounded)));

        // membership and sizes of a{2,4}
        let r = parse("a{2,4}").unwrap();
        assert!(r.rejects("a"));
        assert!(r.accepts("aa"));
        assert!(r.accepts("aaaa"));
        assert!(r.rejects("aaaaa"));
        assert_eq!(r.match_sizes(), Some((Size::Finite(2), Size::Finite(4))));

        // containment
        let narrow = parse("a*").unwrap();
        let wide = parse("(a|b)*").unwrap();
        assert_eq!(
            narrow.partial_compare(wide),
            Some(std::cmp::Ordering::Less)
        );
        assert!(narrow.proper_subset_of(wide));
        assert!(wide.proper_superset_of(narrow));
        let left = parse("a*b*").unwrap();
        let right = parse("b*a*").unwrap();
        assert_eq!(left.partial_compare(right), None);
        assert!(!left.subset_of(right) && !left.superset_of(right));

        // complement agrees with universe difference
        let a_star = parse("a*").unwrap();
        let c1 = universe() - a_star;
        let c2 = !a_star;
        assert!(c1.equiv(c2));
        assert!(c2.accepts("b") && c2.accepts("ab"));
        assert!(c2.rejects("") && c2.rejects("aa"));
    }

    #[test]
    fn derived_predicates() {
        let a = letter('a');
        let a_star = a.star();
        let a_plus = a.plus();

        assert!(a_plus.proper_subset_of(a_star));
        assert!(a_plus.subset_of(a_plus));
        assert!(!a_plus.proper_subset_of(a_plus));
        assert!(a_star.superset_of(a_plus));
        assert!(a.pow(2).equiv(a.repeat(2, 2).unwrap()));
        assert!(a.opt().equiv(a + epsilon()));
    }

    #[test]
    fn derivatives_on_the_surface() {
        let r = parse("ab*").unwrap();
        let bs = parse("b*").unwrap();
        assert!(r.derivative('a').equiv(bs));
        assert!(r.derivative('b').is_empty());
        assert!(r.word_derivative("abb").equiv(bs));
        assert!(r.word_derivative("").equiv(r));
    }
}
