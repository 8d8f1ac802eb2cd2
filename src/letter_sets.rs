// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Character sets and alphabet partitions
//!
//! A character is an unsigned integer in the range `[0..MAX_CHAR]` where
//! [MAX_CHAR] is the largest Unicode scalar value. We represent characters
//! by `u32` integers in this range and make no use of Unicode categories.
//!
//! A [CharRange] is a pair of two integers, `start` and `end`, where
//! `start <= end` and `end <= MAX_CHAR`. It denotes the character interval
//! `[start, end]`.
//!
//! A [LetterSet] is a finite set of characters stored as an ordered list of
//! disjoint, non-adjacent ranges:
//!
//! [a<sub>0</sub>, b<sub>0</sub>], [a<sub>1</sub>, b<sub>1</sub>], ..., [a<sub>k</sub>, b<sub>k</sub>]
//! where a<sub>i</sub> <= b<sub>i</sub> and b<sub>i</sub> + 1 < a<sub>i+1</sub>.
//!
//! Letter sets support the usual set algebra (union, intersection,
//! difference) plus the [venn] partition: given two lists of pairwise
//! disjoint letter sets, `venn` produces a list of pairwise disjoint pieces,
//! each tagged with the side(s) that cover it. Derivative-based algorithms
//! use `venn` to split the alphabet into classes of characters that behave
//! identically under one derivative step, so each step is taken once per
//! class rather than once per character.
//!

use std::cmp::{max, min};
use std::fmt::Display;

/// Largest character: the top of the Unicode scalar-value range.
pub const MAX_CHAR: u32 = 0x10FFFF;

///
/// Interval [start, end] where start <= end <= [MAX_CHAR].
///
/// This represents a contiguous range of characters.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct CharRange {
    start: u32,
    end: u32,
}

impl CharRange {
    /// Construct the singleton interval [x, x]
    ///
    /// The integer x must be a valid character (i.e., 0 <= x <= [MAX_CHAR]).
    pub fn singleton(x: u32) -> CharRange {
        debug_assert!(x <= MAX_CHAR);
        CharRange { start: x, end: x }
    }

    /// Construct the interval [x, y]
    ///
    /// Requires x <= y <= [MAX_CHAR].
    pub fn range(x: u32, y: u32) -> CharRange {
        debug_assert!(x <= y && y <= MAX_CHAR);
        CharRange { start: x, end: y }
    }

    /// Construct the interval [0, [MAX_CHAR]]
    pub fn all_chars() -> CharRange {
        CharRange {
            start: 0,
            end: MAX_CHAR,
        }
    }

    /// First character of the interval
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last character of the interval
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Check whether x is in this interval
    pub fn contains(&self, x: u32) -> bool {
        self.start <= x && x <= self.end
    }

    /// Check whether the interval is a single character
    pub fn is_singleton(&self) -> bool {
        self.start == self.end
    }

    /// Check whether the interval is the full alphabet
    pub fn is_alphabet(&self) -> bool {
        self.start == 0 && self.end == MAX_CHAR
    }

    /// Number of characters in the interval
    pub fn size(&self) -> u64 {
        (self.end - self.start + 1) as u64
    }

    /// Intersection of two intervals
    ///
    /// Return None if the intersection is empty.
    pub fn inter(&self, other: &CharRange) -> Option<CharRange> {
        let max_start = max(self.start, other.start);
        let min_end = min(self.end, other.end);
        if max_start <= min_end {
            Some(Self::range(max_start, min_end))
        } else {
            None
        }
    }
}

///
/// Finite set of characters: an ordered union of disjoint ranges
///
/// The empty set has no ranges. Two ranges in a set are never adjacent:
/// `[a, b]` and `[b+1, c]` are always stored merged as `[a, c]`.
///
#[derive(Debug, PartialEq, Eq, Clone, Hash, Default)]
pub struct LetterSet {
    ranges: Vec<CharRange>,
}

/// Append r at the end of a sorted range list, merging it into the last
/// range if the two overlap or are adjacent.
///
/// Requires r.start >= last.start for the current last range.
fn push_merged(out: &mut Vec<CharRange>, r: CharRange) {
    if let Some(last) = out.last_mut() {
        debug_assert!(last.start <= r.start);
        if r.start <= last.end || r.start == last.end + 1 {
            last.end = max(last.end, r.end);
            return;
        }
    }
    out.push(r);
}

impl LetterSet {
    /// The empty set
    pub fn empty() -> LetterSet {
        LetterSet::default()
    }

    /// The set {x}
    ///
    /// The integer x must be a valid character (i.e., 0 <= x <= [MAX_CHAR]).
    pub fn singleton(x: u32) -> LetterSet {
        LetterSet {
            ranges: vec![CharRange::singleton(x)],
        }
    }

    /// The set of all characters in [x, y]
    ///
    /// Requires x <= y <= [MAX_CHAR].
    pub fn range(x: u32, y: u32) -> LetterSet {
        LetterSet {
            ranges: vec![CharRange::range(x, y)],
        }
    }

    /// The full alphabet
    pub fn full() -> LetterSet {
        LetterSet {
            ranges: vec![CharRange::all_chars()],
        }
    }

    /// Build a set from arbitrary ranges
    ///
    /// The ranges may overlap and may be listed in any order.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::letter_sets::*;
    ///
    /// let s = LetterSet::from_ranges([
    ///     CharRange::range('f' as u32, 'k' as u32),
    ///     CharRange::range('a' as u32, 'd' as u32),
    ///     CharRange::range('e' as u32, 'g' as u32),
    /// ]);
    /// assert_eq!(s, LetterSet::range('a' as u32, 'k' as u32));
    /// ```
    pub fn from_ranges(iter: impl IntoIterator<Item = CharRange>) -> LetterSet {
        let mut v: Vec<CharRange> = iter.into_iter().collect();
        v.sort_by_key(|r| r.start);
        let mut ranges = Vec::with_capacity(v.len());
        for r in v {
            push_merged(&mut ranges, r);
        }
        LetterSet { ranges }
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check whether the set is the full alphabet
    pub fn is_full(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].is_alphabet()
    }

    /// Number of characters in the set
    pub fn size(&self) -> u64 {
        self.ranges.iter().map(|r| r.size()).sum()
    }

    /// Smallest character of the set, or None if the set is empty
    pub fn min(&self) -> Option<u32> {
        self.ranges.first().map(|r| r.start)
    }

    /// Largest character of the set, or None if the set is empty
    pub fn max(&self) -> Option<u32> {
        self.ranges.last().map(|r| r.end)
    }

    /// The unique element, if the set is a singleton
    pub fn single_value(&self) -> Option<u32> {
        match self.ranges.as_slice() {
            [r] if r.is_singleton() => Some(r.start),
            _ => None,
        }
    }

    /// Pick a character in the set
    ///
    /// # Panics
    ///
    /// If the set is empty.
    pub fn pick(&self) -> u32 {
        self.ranges[0].start
    }

    /// Check whether x is in the set
    pub fn contains(&self, x: u32) -> bool {
        // binary search on the sorted, disjoint ranges
        let mut i = 0;
        let mut j = self.ranges.len();
        while i < j {
            let h = i + (j - i) / 2;
            let r = &self.ranges[h];
            if r.contains(x) {
                return true;
            }
            if r.end < x {
                i = h + 1;
            } else {
                j = h;
            }
        }
        false
    }

    /// Iterator over the ranges of the set, in increasing order
    pub fn ranges(&self) -> impl Iterator<Item = &CharRange> {
        self.ranges.iter()
    }

    /// Union of two sets
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::letter_sets::*;
    ///
    /// let a = LetterSet::range('a' as u32, 'c' as u32);
    /// let b = LetterSet::range('b' as u32, 'd' as u32);
    /// assert_eq!(a.union(&b), LetterSet::range('a' as u32, 'd' as u32));
    /// ```
    pub fn union(&self, other: &LetterSet) -> LetterSet {
        let a = &self.ranges;
        let b = &other.ranges;
        let mut out = Vec::with_capacity(a.len() + b.len());
        let mut i = 0;
        let mut j = 0;
        while i < a.len() || j < b.len() {
            let take_a = match (a.get(i), b.get(j)) {
                (Some(x), Some(y)) => x.start <= y.start,
                (Some(_), None) => true,
                _ => false,
            };
            if take_a {
                push_merged(&mut out, a[i]);
                i += 1;
            } else {
                push_merged(&mut out, b[j]);
                j += 1;
            }
        }
        LetterSet { ranges: out }
    }

    /// Intersection of two sets
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::letter_sets::*;
    ///
    /// let a = LetterSet::range('a' as u32, 'c' as u32);
    /// let b = LetterSet::range('b' as u32, 'd' as u32);
    /// assert_eq!(a.inter(&b), LetterSet::range('b' as u32, 'c' as u32));
    /// ```
    pub fn inter(&self, other: &LetterSet) -> LetterSet {
        let a = &self.ranges;
        let b = &other.ranges;
        let mut out = Vec::new();
        let mut i = 0;
        let mut j = 0;
        while i < a.len() && j < b.len() {
            if let Some(r) = a[i].inter(&b[j]) {
                out.push(r);
            }
            if a[i].end <= b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        LetterSet { ranges: out }
    }

    /// Difference of two sets (characters of self not in other)
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::letter_sets::*;
    ///
    /// let a = LetterSet::range('a' as u32, 'c' as u32);
    /// let b = LetterSet::range('b' as u32, 'd' as u32);
    /// assert_eq!(a.diff(&b), LetterSet::singleton('a' as u32));
    /// ```
    pub fn diff(&self, other: &LetterSet) -> LetterSet {
        let b = &other.ranges;
        let mut out = Vec::new();
        let mut j = 0;
        for x in &self.ranges {
            // skip the ranges of b that end before x
            while j < b.len() && b[j].end < x.start {
                j += 1;
            }
            let mut lo = x.start;
            let mut k = j;
            let mut exhausted = false;
            while k < b.len() && b[k].start <= x.end {
                if b[k].start > lo {
                    out.push(CharRange::range(lo, b[k].start - 1));
                }
                if b[k].end >= x.end {
                    exhausted = true;
                    break;
                }
                lo = max(lo, b[k].end + 1);
                k += 1;
            }
            if !exhausted && lo <= x.end {
                out.push(CharRange::range(lo, x.end));
            }
        }
        LetterSet { ranges: out }
    }

    /// Check whether the two sets have no character in common
    pub fn is_disjoint(&self, other: &LetterSet) -> bool {
        self.inter(other).is_empty()
    }
}

impl Display for LetterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_char(f: &mut std::fmt::Formatter<'_>, x: u32) -> std::fmt::Result {
            match char::from_u32(x) {
                Some(c) if !c.is_control() && !c.is_whitespace() => write!(f, "{}", c),
                _ => write!(f, "\\u{{{:x}}}", x),
            }
        }

        if self.is_full() {
            return write!(f, "\u{03a3}"); // Sigma
        }
        write!(f, "{{")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write_char(f, r.start)?;
            if !r.is_singleton() {
                write!(f, "-")?;
                write_char(f, r.end)?;
            }
        }
        write!(f, "}}")
    }
}

///
/// A piece of a Venn partition
///
/// Each piece is a non-empty letter set tagged with the side(s) of the
/// input that cover it. See [venn].
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum VennClass {
    /// Covered by one left-hand set only
    Left(LetterSet),
    /// Covered by one right-hand set only
    Right(LetterSet),
    /// Covered by one left-hand set and one right-hand set
    Both(LetterSet),
}

impl VennClass {
    /// The characters of the piece
    pub fn set(&self) -> &LetterSet {
        match self {
            VennClass::Left(s) | VennClass::Right(s) | VennClass::Both(s) => s,
        }
    }

    /// Extract the characters of the piece
    pub fn into_set(self) -> LetterSet {
        match self {
            VennClass::Left(s) | VennClass::Right(s) | VennClass::Both(s) => s,
        }
    }

    /// Check whether the piece is covered by both sides
    pub fn is_both(&self) -> bool {
        matches!(self, VennClass::Both(_))
    }
}

///
/// Venn partition of two lists of pairwise disjoint letter sets
///
/// The result is a list of pairwise disjoint, non-empty pieces whose union
/// is (∪ a) ∪ (∪ b). Each piece lies entirely inside zero-or-one element of
/// `a` and zero-or-one element of `b`, and is tagged accordingly:
/// - [VennClass::Left]: inside one element of `a`, disjoint from all of `b`
/// - [VennClass::Right]: inside one element of `b`, disjoint from all of `a`
/// - [VennClass::Both]: inside one element of `a` and one element of `b`
///
/// Pieces are listed left-only first, then right-only, then both, each
/// group following the order of the inputs.
///
/// # Example
///
/// ```
/// use rx_algebra::letter_sets::*;
///
/// let a = [LetterSet::range('a' as u32, 'c' as u32)];
/// let b = [LetterSet::range('b' as u32, 'd' as u32)];
/// let pieces = venn(&a, &b);
///
/// assert_eq!(pieces.len(), 3);
/// assert!(pieces.contains(&VennClass::Left(LetterSet::singleton('a' as u32))));
/// assert!(pieces.contains(&VennClass::Right(LetterSet::singleton('d' as u32))));
/// assert!(pieces.contains(&VennClass::Both(LetterSet::range('b' as u32, 'c' as u32))));
/// ```
pub fn venn(a: &[LetterSet], b: &[LetterSet]) -> Vec<VennClass> {
    fn union_all(sets: &[LetterSet]) -> LetterSet {
        let mut result = LetterSet::empty();
        for s in sets {
            result = result.union(s);
        }
        result
    }

    let cover_a = union_all(a);
    let cover_b = union_all(b);

    let mut pieces = Vec::new();
    for x in a {
        let left = x.diff(&cover_b);
        if !left.is_empty() {
            pieces.push(VennClass::Left(left));
        }
    }
    for y in b {
        let right = y.diff(&cover_a);
        if !right.is_empty() {
            pieces.push(VennClass::Right(right));
        }
    }
    for x in a {
        for y in b {
            let both = x.inter(y);
            if !both.is_empty() {
                pieces.push(VennClass::Both(both));
            }
        }
    }
    pieces
}

#[cfg(test)]
mod test {
    use super::*;

    /// check the representation invariant: sorted, disjoint, non-adjacent
    fn good_set(s: &LetterSet) -> bool {
        let mut prev_end: Option<u32> = None;
        for r in s.ranges() {
            if r.start() > r.end() || r.end() > MAX_CHAR {
                return false;
            }
            if let Some(e) = prev_end {
                if r.start() <= e + 1 {
                    return false;
                }
            }
            prev_end = Some(r.end());
        }
        true
    }

    fn example1() -> LetterSet {
        LetterSet::from_ranges([
            CharRange::range('0' as u32, '9' as u32),
            CharRange::singleton('Z' as u32),
            CharRange::range('f' as u32, 'q' as u32),
        ])
    }

    fn example2() -> LetterSet {
        LetterSet::from_ranges([
            CharRange::singleton('0' as u32),
            CharRange::range('A' as u32, 'M' as u32),
            CharRange::range('a' as u32, 'n' as u32),
        ])
    }

    #[test]
    fn test_simple() {
        let e = LetterSet::empty();
        let s = LetterSet::singleton('K' as u32);
        let r = LetterSet::range('a' as u32, 'z' as u32);
        let f = LetterSet::full();

        assert!(good_set(&e) && good_set(&s) && good_set(&r) && good_set(&f));

        assert!(e.is_empty());
        assert_eq!(e.min(), None);
        assert_eq!(e.size(), 0);

        assert_eq!(s.single_value(), Some('K' as u32));
        assert_eq!(s.size(), 1);

        assert_eq!(r.min(), Some('a' as u32));
        assert_eq!(r.max(), Some('z' as u32));
        assert_eq!(r.single_value(), None);
        assert_eq!(r.size(), 26);
        assert!(r.contains('g' as u32));
        assert!(!r.contains('G' as u32));

        assert!(f.is_full());
        assert_eq!(f.size(), MAX_CHAR as u64 + 1);
        assert!(f.contains(0));
        assert!(f.contains(MAX_CHAR));
    }

    #[test]
    fn test_normalization() {
        // overlapping and adjacent ranges merge
        let s = LetterSet::from_ranges([
            CharRange::range(10, 20),
            CharRange::range(21, 30),
            CharRange::range(25, 40),
            CharRange::range(50, 60),
        ]);
        assert!(good_set(&s));
        assert_eq!(s.ranges().count(), 2);
        assert_eq!(s.min(), Some(10));
        assert_eq!(s.max(), Some(60));
        assert_eq!(s.size(), 42);
    }

    #[test]
    fn test_ops() {
        let v = vec![
            LetterSet::empty(),
            LetterSet::singleton(0),
            LetterSet::singleton(MAX_CHAR),
            example1(),
            example2(),
            LetterSet::full(),
        ];

        for a in &v {
            for b in &v {
                let u = a.union(b);
                let i = a.inter(b);
                let d = a.diff(b);

                assert!(good_set(&u), "bad union of {} and {}", a, b);
                assert!(good_set(&i), "bad inter of {} and {}", a, b);
                assert!(good_set(&d), "bad diff of {} and {}", a, b);

                assert_eq!(u, b.union(a));
                assert_eq!(i, a.diff(&d));
                assert_eq!(u.size(), a.size() + b.size() - i.size());
                assert!(d.is_disjoint(b));
                assert_eq!(d.union(&i), *a);
            }
        }
    }

    #[test]
    fn test_membership_after_ops() {
        let a = example1();
        let b = example2();
        let probes = ['0', '5', 'A', 'K', 'Z', 'a', 'g', 'p', 'z'];

        for c in probes {
            let c = c as u32;
            assert_eq!(a.union(&b).contains(c), a.contains(c) || b.contains(c));
            assert_eq!(a.inter(&b).contains(c), a.contains(c) && b.contains(c));
            assert_eq!(a.diff(&b).contains(c), a.contains(c) && !b.contains(c));
        }
    }

    #[test]
    fn test_venn() {
        let a = [
            LetterSet::range('a' as u32, 'f' as u32),
            LetterSet::range('x' as u32, 'z' as u32),
        ];
        let b = [
            LetterSet::range('d' as u32, 'h' as u32),
            LetterSet::singleton('y' as u32),
        ];

        let pieces = venn(&a, &b);
        for p in &pieces {
            assert!(good_set(p.set()));
            assert!(!p.set().is_empty());
        }

        // pieces are pairwise disjoint
        for (i, p) in pieces.iter().enumerate() {
            for q in &pieces[i + 1..] {
                assert!(p.set().is_disjoint(q.set()), "{:?} overlaps {:?}", p, q);
            }
        }

        // the union of the pieces covers both sides exactly
        let mut covered = LetterSet::empty();
        for p in &pieces {
            covered = covered.union(p.set());
        }
        let mut expected = LetterSet::empty();
        for s in a.iter().chain(b.iter()) {
            expected = expected.union(s);
        }
        assert_eq!(covered, expected);

        // tags are consistent with membership
        for p in &pieces {
            let in_a = a.iter().any(|s| !s.inter(p.set()).is_empty());
            let in_b = b.iter().any(|s| !s.inter(p.set()).is_empty());
            match p {
                VennClass::Left(_) => assert!(in_a && !in_b),
                VennClass::Right(_) => assert!(!in_a && in_b),
                VennClass::Both(_) => assert!(in_a && in_b),
            }
        }
    }

    #[test]
    fn test_venn_empty_sides() {
        let a = [example1()];
        assert_eq!(venn(&a, &[]), vec![VennClass::Left(example1())]);
        assert_eq!(venn(&[], &a), vec![VennClass::Right(example1())]);
        assert!(venn(&[], &[]).is_empty());
    }
}
