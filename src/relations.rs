// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Equivalence and containment of regular languages
//!
//! Both procedures walk the pair automaton induced by derivatives: two
//! terms are related if they agree on nullability and their derivatives
//! are related for every character class. The walk is a coinductive
//! bisimulation: a pair that is reached again is assumed related (the
//! coinduction hypothesis), which makes the traversal terminate because
//! partial derivatives produce only finitely many distinct residues.
//!
//! Containment is decided as a four-valued comparison: equivalent,
//! proper-or-improper subset, superset, or incomparable. Verdicts from
//! nullability, size ranges, and the per-class walk are combined with a
//! lattice join ([acc]): agreeing verdicts keep their direction, an
//! `Equal` is neutral, and conflicting directions collapse to
//! incomparable.
//!

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::letter_sets::{venn, VennClass};
use crate::sizes::Size;
use crate::terms::{Lang, RxManager};

/// Join two comparison verdicts
///
/// None means incomparable and is absorbing. `Equal` is the neutral
/// element. `Less` and `Greater` keep their direction and collapse to
/// None when mixed.
pub(crate) fn acc(x: Option<Ordering>, y: Option<Ordering>) -> Option<Ordering> {
    match (x, y) {
        (None, _) | (_, None) => None,
        (Some(Ordering::Equal), s) => s,
        (s, Some(Ordering::Equal)) => s,
        (Some(a), Some(b)) if a == b => Some(a),
        _ => None,
    }
}

/// Compare two size ranges by interval containment
///
/// None stands for the empty range and is contained in everything.
pub(crate) fn range_subset(
    a: Option<(Size, Size)>,
    b: Option<(Size, Size)>,
) -> Option<Ordering> {
    match (a, b) {
        (None, None) => Some(Ordering::Equal),
        (None, Some(_)) => Some(Ordering::Less),
        (Some(_), None) => Some(Ordering::Greater),
        (Some((lo1, hi1)), Some((lo2, hi2))) => {
            if lo1 == lo2 && hi1 == hi2 {
                Some(Ordering::Equal)
            } else if lo2 <= lo1 && hi1 <= hi2 {
                Some(Ordering::Less)
            } else if lo1 <= lo2 && hi2 <= hi1 {
                Some(Ordering::Greater)
            } else {
                None
            }
        }
    }
}

impl RxManager {
    /// Decide whether two terms denote the same language
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.letter('a' as u32);
    /// let a_star = rx.star(a);
    ///
    /// // (aa)* + (aa)*a describes the same language as a*
    /// let aa = rx.literal("aa");
    /// let aa_star = rx.star(aa);
    /// let odd = rx.concat(aa_star, a);
    /// let s = rx.choice(aa_star, odd);
    ///
    /// assert!(rx.equiv(a_star, s));
    /// ```
    pub fn equiv(&mut self, e1: Lang, e2: Lang) -> bool {
        assert!(
            !e1.has_var() && !e2.has_var(),
            "internal invariant violated: free recursion variable"
        );
        let mut env = HashSet::new();
        self.equiv_rec(e1, e2, &mut env)
    }

    fn equiv_rec(&mut self, e1: Lang, e2: Lang, env: &mut HashSet<(usize, usize)>) -> bool {
        if e1 == e2 {
            return true;
        }
        if e1.nullable != e2.nullable {
            return false;
        }
        if e1.is_empty() != e2.is_empty() {
            return false;
        }
        if env.contains(&(e1.id(), e2.id())) {
            return true;
        }
        if e1.match_sizes() != e2.match_sizes() {
            return false;
        }
        let classes = venn(e1.first_set(), e2.first_set());
        // a class one side can start with and the other cannot
        if classes.iter().any(|p| !p.is_both()) {
            return false;
        }
        env.insert((e1.id(), e2.id()));
        for p in &classes {
            let w = p.set().pick();
            let d1 = self.deriv(e1, w);
            let d2 = self.deriv(e2, w);
            if !self.equiv_rec(d1, d2, env) {
                return false;
            }
        }
        true
    }

    /// Compare two terms by language containment
    ///
    /// - `Some(Equal)`: the languages are equal
    /// - `Some(Less)`: the first language is contained in the second
    /// - `Some(Greater)`: the second language is contained in the first
    /// - `None`: neither contains the other
    ///
    /// # Example
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.letter('a' as u32);
    /// let a_star = rx.star(a);
    /// let ab = rx.range('a' as u32, 'b' as u32);
    /// let ab_star = rx.star(ab);
    ///
    /// assert_eq!(rx.partial_compare(a_star, ab_star), Some(Ordering::Less));
    /// assert_eq!(rx.partial_compare(ab_star, a_star), Some(Ordering::Greater));
    /// assert_eq!(rx.partial_compare(a_star, a_star), Some(Ordering::Equal));
    /// ```
    pub fn partial_compare(&mut self, e1: Lang, e2: Lang) -> Option<Ordering> {
        assert!(
            !e1.has_var() && !e2.has_var(),
            "internal invariant violated: free recursion variable"
        );
        let mut env = HashSet::new();
        self.compare_rec(e1, e2, &mut env)
    }

    fn compare_rec(
        &mut self,
        e1: Lang,
        e2: Lang,
        env: &mut HashSet<(usize, usize)>,
    ) -> Option<Ordering> {
        if e1 == e2 {
            return Some(Ordering::Equal);
        }
        // identity shortcuts on the empty language and the empty string
        if e1.is_empty() {
            return if e2.is_empty() {
                Some(Ordering::Equal)
            } else {
                Some(Ordering::Less)
            };
        }
        if e2.is_empty() {
            return Some(Ordering::Greater);
        }
        if e1.is_epsilon() {
            return if e2.is_epsilon() {
                Some(Ordering::Equal)
            } else if e2.nullable {
                Some(Ordering::Less)
            } else {
                None
            };
        }
        if e2.is_epsilon() {
            return if e1.nullable {
                Some(Ordering::Greater)
            } else {
                None
            };
        }
        if env.contains(&(e1.id(), e2.id())) {
            return Some(Ordering::Equal);
        }

        // seed the verdict from nullability
        let mut res = match (e1.nullable, e2.nullable) {
            (true, false) => Some(Ordering::Greater),
            (false, true) => Some(Ordering::Less),
            _ => Some(Ordering::Equal),
        };
        res = acc(res, range_subset(e1.match_sizes(), e2.match_sizes()));
        if res.is_none() {
            return None;
        }

        let classes = venn(e1.first_set(), e2.first_set());
        env.insert((e1.id(), e2.id()));
        for p in &classes {
            match p {
                // a start character only the left side has pushes toward superset
                VennClass::Left(_) => res = acc(res, Some(Ordering::Greater)),
                VennClass::Right(_) => res = acc(res, Some(Ordering::Less)),
                VennClass::Both(cs) => {
                    let w = cs.pick();
                    let d1 = self.deriv(e1, w);
                    let d2 = self.deriv(e2, w);
                    let sub = self.compare_rec(d1, d2, env);
                    res = acc(res, sub);
                }
            }
            if res.is_none() {
                return None;
            }
        }
        res
    }
}
