// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Regular-expression terms
//!
//! This module defines the abstract syntax of regular expressions [BaseRx]
//! and the regular expression type [Rx]. Regular expressions are built using
//! an [RxManager], which provides hash consing.
//!
//! Input to the manager's methods are static references to [Rx] objects
//! (see type [Lang]). The manager also returns objects of type [Lang]
//! when producing regular expressions.
//!
//! [RxManager] also implements the *partial derivative* operation. The
//! partial derivative of a regular expression R with respect to a character
//! c is a set of regular expressions whose union defines all the strings
//! that can follow c in the language of R. For example, the partial
//! derivative of '(ab + ac)\*' with respect to 'a' is the two-element set
//! { 'b(ab + ac)\*', 'c(ab + ac)\*' }. Returning a set rather than a single
//! expression keeps sub-expressions shared, so iterated derivatives reach
//! only finitely many distinct residues.
//!
//! For a regular expression R, the attribute `first` is a list of disjoint
//! [LetterSet]s covering exactly the characters that can start a string of
//! R. Each list element is a *derivative class*: if two characters `c1` and
//! `c2` are in the same class, the derivative of R with respect to `c1` and
//! the derivative of R with respect to `c2` are equal. Fixed-point
//! traversals take one derivative step per class instead of one per
//! character; characters outside every class have the empty derivative.
//!

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::rc::Rc;

use crate::errors::Error;
use crate::letter_sets::{venn, LetterSet, VennClass, MAX_CHAR};
use crate::sizes::Size;
use crate::store::{Interned, Interner};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
///
/// Abstract syntax for regular expressions
///
pub enum BaseRx {
    /// The empty language
    Empty,

    /// The language that contains only the empty string
    Epsilon,

    /// Words of length one over a single character
    Letter(u32),

    /// Words of length one with characters in a set of two or more
    Letters(LetterSet),

    /// Union of two languages
    Choice(Lang, Lang),

    /// Concatenation of two languages
    Concat(Lang, Lang),

    /// Kleene closure
    Star(Lang),

    /// Between m and n copies, with m <= n and n >= 1
    Repeat(Lang, u32, u32),

    /// Recursion marker used while solving language equations.
    ///
    /// A `Var` never appears in a term returned to a caller; it exists
    /// only during one activation of the set-algebra and canonicalization
    /// procedures.
    Var(u32),
}

/// Reference to a regular expression descriptor
pub type Lang = &'static Rx;

///
/// Regular expression structure
///
/// A regular expression includes an expression of type [BaseRx], which is
/// an abstract syntax tree.
///
/// In addition, each regular expression e has a unique integer id and
/// derived attributes computed once at construction:
/// - e.nullable is true if the language of e contains the empty string
/// - e.single is true if the language of e contains a single string
/// - e.first is the list of derivative classes of e
/// - e.sizes bounds the length of the accepted strings
///
/// The derivative classes are disjoint letter sets that cover exactly the
/// characters that can start a string of e. They are constructed so that
/// all the characters in a class produce the same derivative of e: if c1
/// and c2 are in the same class then deriv(e, c1) and deriv(e, c2) are
/// equal. Characters outside every class derive to the empty language.
///
/// Operations on regular expressions use hash-consing and are performed
/// with an [RxManager].
#[derive(Debug)]
pub struct Rx {
    /// Abstract syntax tree
    base: BaseRx,
    /// Unique id for this term
    id: usize,
    /// Whether the language contains the empty string
    pub nullable: bool,
    /// Whether the language contains exactly one string
    single: bool,
    /// Whether the tree contains a recursion marker
    has_var: bool,
    /// Derivative classes: disjoint sets of characters that can start a string
    first: Rc<[LetterSet]>,
    /// Bounds on the length of accepted strings (None for the empty language)
    sizes: Option<(Size, Size)>,
}

/// Equality on Rx is derived from the unique ids.
///
/// Two terms built by the same manager are equal iff they have the same id.
impl PartialEq for Rx {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Rx {}

/// Ordering on terms is based on unique ids.
impl PartialOrd for Rx {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rx {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// The hash code of a term is just the hash code of its id.
impl Hash for Rx {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl BaseRx {
    /// Check whether the empty word is in this language
    fn is_nullable(&self) -> bool {
        match self {
            BaseRx::Empty => false,
            BaseRx::Epsilon => true,
            BaseRx::Letter(_) => false,
            BaseRx::Letters(_) => false,
            BaseRx::Choice(e1, e2) => e1.nullable || e2.nullable,
            BaseRx::Concat(e1, e2) => e1.nullable && e2.nullable,
            BaseRx::Star(_) => true,
            BaseRx::Repeat(e, m, _) => *m == 0 || e.nullable,
            // inert: a Var never reaches a nullability query
            BaseRx::Var(_) => false,
        }
    }

    /// Check whether this language contains a single string
    fn is_single(&self) -> bool {
        match self {
            BaseRx::Epsilon => true,
            BaseRx::Letter(_) => true,
            BaseRx::Concat(e1, e2) => e1.single && e2.single,
            BaseRx::Repeat(e, m, n) => e.single && *m == *n,
            _ => false,
        }
    }

    /// Check whether this tree contains a recursion marker
    fn has_var(&self) -> bool {
        match self {
            BaseRx::Var(_) => true,
            BaseRx::Choice(e1, e2) | BaseRx::Concat(e1, e2) => e1.has_var || e2.has_var,
            BaseRx::Star(e) | BaseRx::Repeat(e, _, _) => e.has_var,
            _ => false,
        }
    }

    /// Compute the derivative classes for this regular expression
    fn first_classes(&self) -> Rc<[LetterSet]> {
        fn merge(a: &[LetterSet], b: &[LetterSet]) -> Rc<[LetterSet]> {
            venn(a, b).into_iter().map(VennClass::into_set).collect()
        }

        match self {
            BaseRx::Empty | BaseRx::Epsilon | BaseRx::Var(_) => Rc::from(Vec::new()),
            BaseRx::Letter(c) => Rc::from(vec![LetterSet::singleton(*c)]),
            BaseRx::Letters(s) => Rc::from(vec![s.clone()]),
            BaseRx::Choice(e1, e2) => merge(&e1.first, &e2.first),
            BaseRx::Concat(e1, e2) => {
                if e1.nullable {
                    merge(&e1.first, &e2.first)
                } else {
                    e1.first.clone()
                }
            }
            BaseRx::Star(e) | BaseRx::Repeat(e, _, _) => e.first.clone(),
        }
    }

    /// Compute the match-size range for this regular expression
    fn size_range(&self) -> Option<(Size, Size)> {
        match self {
            BaseRx::Empty | BaseRx::Var(_) => None,
            BaseRx::Epsilon => Some((Size::ZERO, Size::ZERO)),
            BaseRx::Letter(_) | BaseRx::Letters(_) => Some((Size::ONE, Size::ONE)),
            BaseRx::Choice(e1, e2) => match (e1.sizes, e2.sizes) {
                (None, s) | (s, None) => s,
                (Some((lo1, hi1)), Some((lo2, hi2))) => Some((lo1.min(lo2), hi1.max(hi2))),
            },
            BaseRx::Concat(e1, e2) => match (e1.sizes, e2.sizes) {
                (Some((lo1, hi1)), Some((lo2, hi2))) => Some((lo1 + lo2, hi1 + hi2)),
                _ => None,
            },
            BaseRx::Star(e) => match e.sizes {
                None => Some((Size::ZERO, Size::ZERO)),
                Some((_, hi)) => Some((Size::ZERO, hi * Size::Unbounded)),
            },
            BaseRx::Repeat(e, m, n) => match e.sizes {
                None => {
                    if *m > 0 {
                        None
                    } else {
                        Some((Size::ZERO, Size::ZERO))
                    }
                }
                Some((lo, hi)) => Some((lo * Size::from(*m), hi * Size::from(*n))),
            },
        }
    }
}

impl Interned for Rx {
    type Key = BaseRx;

    fn build(id: usize, k: &Self::Key) -> Self {
        Rx {
            base: k.clone(),
            id,
            nullable: k.is_nullable(),
            single: k.is_single(),
            has_var: k.has_var(),
            first: k.first_classes(),
            sizes: k.size_range(),
        }
    }
}

impl Rx {
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn base(&self) -> &BaseRx {
        &self.base
    }

    pub(crate) fn has_var(&self) -> bool {
        self.has_var
    }

    /// The derivative classes of this term
    ///
    /// The returned sets are pairwise disjoint and cover exactly the
    /// characters c for which the derivative is not the empty language.
    pub fn first_set(&self) -> &[LetterSet] {
        &self.first
    }

    /// Bounds on the length of the accepted strings
    ///
    /// Return None if the language is empty, and a pair (lo, hi) such that
    /// every accepted string has a length in [lo, hi] otherwise.
    pub fn match_sizes(&self) -> Option<(Size, Size)> {
        self.sizes
    }

    /// Check whether the language contains exactly one string
    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Check whether this term denotes the empty language
    ///
    /// The check is structural: it holds only if every branch of the tree
    /// contributes nothing (an empty factor anywhere in a concatenation,
    /// and both sides of every union).
    pub fn is_empty(&self) -> bool {
        match &self.base {
            BaseRx::Empty => true,
            BaseRx::Choice(e1, e2) => e1.is_empty() && e2.is_empty(),
            BaseRx::Concat(e1, e2) => e1.is_empty() || e2.is_empty(),
            BaseRx::Repeat(e, m, _) => *m > 0 && e.is_empty(),
            _ => false,
        }
    }

    /// Check whether this term denotes the language {""}
    ///
    /// The check is structural: it holds only if every leaf is the
    /// empty-string term.
    pub fn is_epsilon(&self) -> bool {
        match &self.base {
            BaseRx::Epsilon => true,
            BaseRx::Choice(e1, e2) | BaseRx::Concat(e1, e2) => e1.is_epsilon() && e2.is_epsilon(),
            _ => false,
        }
    }
}

///
/// Collect the members of a union: r = choice(v[0], ..., v[k]) where
/// no member is itself a choice.
///
fn flatten_choice(r: Lang, v: &mut Vec<Lang>) {
    match r.base {
        BaseRx::Choice(e1, e2) => {
            flatten_choice(e1, v);
            flatten_choice(e2, v);
        }
        _ => v.push(r),
    }
}

///
/// Collect the factors of a concatenation: r = concat(v[0], ..., v[k])
/// where no factor is itself a concatenation or epsilon.
///
fn flatten_concat(r: Lang, v: &mut Vec<Lang>) {
    match r.base {
        BaseRx::Epsilon => (), // skip epsilon
        BaseRx::Concat(e1, e2) => {
            flatten_concat(e1, v);
            flatten_concat(e2, v);
        }
        _ => v.push(r),
    }
}

/// Sort a list of terms by id and remove duplicates
pub(crate) fn dedup_terms(v: &mut Vec<Lang>) {
    v.sort_unstable_by_key(|x| x.id);
    v.dedup_by_key(|x| x.id);
}

///
/// Key for the derivative cache: a term and the smallest character of
/// one of its derivative classes.
///
#[derive(Debug, PartialEq, Eq, Hash)]
struct DerivKey(Lang, u32);

/// A store for constructing regular expressions using hash-consing.
///
/// The manager ensures that each regular expression has a unique integer
/// id: for terms e1 and e2 constructed with the same manager, e1.base ==
/// e2.base iff e1 and e2 are the same object.
///
/// # Examples
///
/// This example builds the regular expression `(ab + ac)*` and computes
/// derivatives.
///
/// ```
/// use rx_algebra::terms::*;
///
/// let rx = &mut RxManager::new();
/// let ab = rx.literal("ab");
/// let ac = rx.literal("ac");
/// let sum = rx.choice(ab, ac);
/// let e = rx.star(sum);
///
/// // the partial derivative of e w.r.t. 'a' is { b(ab + ac)*, c(ab + ac)* }
/// let d = rx.partial_deriv(e, 'a' as u32);
/// assert_eq!(d.len(), 2);
/// let b = rx.letter('b' as u32);
/// let tail = rx.concat(b, e);
/// assert!(d.contains(&tail));
///
/// // by hash-consing, recomputing the derivative yields the same object
/// let d1 = rx.deriv(e, 'a' as u32);
/// let d2 = rx.deriv(e, 'a' as u32);
/// assert!(std::ptr::eq(d1, d2));
/// ```
#[derive(Debug)]
pub struct RxManager {
    store: Interner<Rx>,
    empty: Lang,
    epsilon: Lang,
    dot: Lang,
    universe: Lang,
    deriv_cache: HashMap<DerivKey, Lang>,
}

impl RxManager {
    /// Create a new manager
    pub fn new() -> Self {
        let mut store = Interner::new();
        let empty = store.intern(BaseRx::Empty);
        let epsilon = store.intern(BaseRx::Epsilon);
        let dot = store.intern(BaseRx::Letters(LetterSet::full()));
        let universe = store.intern(BaseRx::Star(dot));
        RxManager {
            store,
            empty,
            epsilon,
            dot,
            universe,
            deriv_cache: HashMap::new(),
        }
    }

    /// Internal hash-consing constructor
    fn make(&mut self, base: BaseRx) -> Lang {
        self.store.intern(base)
    }

    /// The empty language
    pub fn empty(&self) -> Lang {
        self.empty
    }

    /// The language that contains only the empty string
    pub fn epsilon(&self) -> Lang {
        self.epsilon
    }

    /// All one-character strings
    pub fn dot(&self) -> Lang {
        self.dot
    }

    /// The language of all strings
    pub fn universe(&self) -> Lang {
        self.universe
    }

    /// A character as a regular expression
    ///
    /// Return the language that contains the one-character string `c` and
    /// nothing else.
    ///
    /// # Panics
    ///
    /// If c > [MAX_CHAR].
    pub fn letter(&mut self, c: u32) -> Lang {
        assert!(c <= MAX_CHAR);
        self.make(BaseRx::Letter(c))
    }

    /// Range of characters
    ///
    /// Return the language of all one-character strings with a character
    /// in [lo, hi].
    ///
    /// # Panics
    ///
    /// If the range is empty (lo > hi) or hi > [MAX_CHAR].
    pub fn range(&mut self, lo: u32, hi: u32) -> Lang {
        assert!(lo <= hi && hi <= MAX_CHAR);
        self.letters(LetterSet::range(lo, hi))
    }

    /// Regular expression defined by a character set
    ///
    /// Return the language of all one-character strings with a character
    /// in `set`. An empty set produces the empty language; a singleton
    /// produces a [BaseRx::Letter] term.
    pub fn letters(&mut self, set: LetterSet) -> Lang {
        if set.is_empty() {
            self.empty
        } else if let Some(c) = set.single_value() {
            self.letter(c)
        } else {
            self.make(BaseRx::Letters(set))
        }
    }

    /// Letter set built from a list of characters
    ///
    /// Convenience constructor: the language of the one-character strings
    /// over the listed characters.
    pub fn letters_from(&mut self, chars: &[char]) -> Lang {
        let mut set = LetterSet::empty();
        for &c in chars {
            set = set.union(&LetterSet::singleton(c as u32));
        }
        self.letters(set)
    }

    /// Recursion marker for the equation-solving procedures.
    ///
    /// Not part of the public surface: a `Var` must never survive the
    /// activation that created it.
    pub(crate) fn var(&mut self, k: u32) -> Lang {
        self.make(BaseRx::Var(k))
    }

    /// Language that contains a single string
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let s = rx.literal("alpha");
    ///
    /// assert!(rx.accepts(s, "alpha"));
    /// assert!(!rx.accepts(s, "beta"));
    /// ```
    pub fn literal(&mut self, s: &str) -> Lang {
        let mut re = self.epsilon;
        for c in s.chars().rev() {
            let l = self.letter(c as u32);
            re = self.concat(l, re);
        }
        re
    }

    /// Union of two languages
    ///
    /// The result is normalized: members are flattened, sorted, and
    /// deduplicated; the empty language is dropped; one-character terms
    /// are fused into a single letter-set term.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.letter('a' as u32);
    /// let b = rx.letter('b' as u32);
    ///
    /// // 'a + b' fuses into the letter set {a, b}
    /// let u = rx.choice(a, b);
    /// assert_eq!(u, rx.range('a' as u32, 'b' as u32));
    /// ```
    pub fn choice(&mut self, e1: Lang, e2: Lang) -> Lang {
        let mut v = Vec::new();
        flatten_choice(e1, &mut v);
        flatten_choice(e2, &mut v);
        self.choice_of(v)
    }

    /// Union of several languages
    ///
    /// Return the union of all the terms produced by `args`, normalized as
    /// in [choice](Self::choice). The union of no terms is the empty
    /// language.
    pub fn choice_list(&mut self, args: impl IntoIterator<Item = Lang>) -> Lang {
        let mut v = Vec::new();
        for x in args {
            flatten_choice(x, &mut v);
        }
        self.choice_of(v)
    }

    /// Build a normalized union from flattened members
    fn choice_of(&mut self, mut v: Vec<Lang>) -> Lang {
        let mut fused = LetterSet::empty();
        v.retain(|x| match &x.base {
            BaseRx::Empty => false,
            BaseRx::Letter(c) => {
                fused = fused.union(&LetterSet::singleton(*c));
                false
            }
            BaseRx::Letters(s) => {
                fused = fused.union(s);
                false
            }
            _ => true,
        });
        if !fused.is_empty() {
            let letters = self.letters(fused);
            v.push(letters);
        }
        dedup_terms(&mut v);
        let mut result = match v.pop() {
            None => return self.empty,
            Some(x) => x,
        };
        for &x in v.iter().rev() {
            result = self.make(BaseRx::Choice(x, result));
        }
        result
    }

    /// Concatenation of two languages
    ///
    /// The result is normalized: the empty language absorbs, the empty
    /// string is the identity, and nested concatenations re-associate to
    /// the right.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.literal("a");
    /// let eps = rx.epsilon();
    ///
    /// assert_eq!(rx.concat(a, eps), a);
    /// assert_eq!(rx.concat(eps, a), a);
    /// ```
    pub fn concat(&mut self, e1: Lang, e2: Lang) -> Lang {
        match (&e1.base, &e2.base) {
            (BaseRx::Empty, _) | (_, BaseRx::Empty) => self.empty,
            (BaseRx::Epsilon, _) => e2,
            (_, BaseRx::Epsilon) => e1,
            (&BaseRx::Concat(x, y), _) => {
                let right = self.concat(y, e2);
                self.concat(x, right)
            }
            _ => self.make(BaseRx::Concat(e1, e2)),
        }
    }

    /// Kleene star closure
    ///
    /// Stars of the empty language and of the empty string collapse to the
    /// empty string; a star of a star collapses to a single star.
    pub fn star(&mut self, e: Lang) -> Lang {
        match &e.base {
            BaseRx::Empty | BaseRx::Epsilon => self.epsilon,
            BaseRx::Star(_) => e,
            _ => self.make(BaseRx::Star(e)),
        }
    }

    /// One or more copies of e
    pub fn plus(&mut self, e: Lang) -> Lang {
        let s = self.star(e);
        self.concat(e, s)
    }

    /// Zero or one copy of e
    pub fn opt(&mut self, e: Lang) -> Lang {
        let eps = self.epsilon;
        self.choice(e, eps)
    }

    /// Repetition with normalized bounds (requires m <= n)
    pub(crate) fn repeat_unchecked(&mut self, e: Lang, m: u32, n: u32) -> Lang {
        debug_assert!(m <= n);
        if n == 0 {
            return self.epsilon;
        }
        if m == 1 && n == 1 {
            return e;
        }
        match &e.base {
            BaseRx::Empty => {
                if m == 0 {
                    self.epsilon
                } else {
                    self.empty
                }
            }
            BaseRx::Epsilon => self.epsilon,
            _ => self.make(BaseRx::Repeat(e, m, n)),
        }
    }

    /// Repetition: between m and n copies of e
    ///
    /// # Errors
    ///
    /// Return [Error::InvalidArgument] unless 0 <= m <= n.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.letter('a' as u32);
    /// let e = rx.repeat(a, 2, 4).unwrap();
    ///
    /// assert!(!rx.accepts(e, "a"));
    /// assert!(rx.accepts(e, "aa"));
    /// assert!(rx.accepts(e, "aaaa"));
    /// assert!(!rx.accepts(e, "aaaaa"));
    ///
    /// assert!(rx.repeat(a, 3, 2).is_err());
    /// ```
    pub fn repeat(&mut self, e: Lang, m: i64, n: i64) -> Result<Lang, Error> {
        if m < 0 || n < m || n > u32::MAX as i64 {
            return Err(Error::InvalidArgument(m, n));
        }
        Ok(self.repeat_unchecked(e, m as u32, n as u32))
    }

    /// Exactly k copies of e
    ///
    /// A non-positive k produces the empty string.
    pub fn pow(&mut self, e: Lang, k: i64) -> Lang {
        if k <= 0 || k > u32::MAX as i64 {
            self.epsilon
        } else {
            self.repeat_unchecked(e, k as u32, k as u32)
        }
    }

    //
    // DERIVATIVES
    //

    /// Partial derivative of e with respect to a character
    ///
    /// Return a set of terms (sorted by id, without duplicates) whose union
    /// is the derivative of e with respect to c: the strings w such that
    /// c.w is in the language of e.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let ab = rx.literal("ab");
    /// let ac = rx.literal("ac");
    /// let e = rx.choice(ab, ac);
    ///
    /// // the partial derivative of 'ab + ac' w.r.t. 'a' is {b, c}
    /// let d = rx.partial_deriv(e, 'a' as u32);
    /// assert_eq!(d.len(), 2);
    /// assert!(d.contains(&rx.literal("b")));
    /// assert!(d.contains(&rx.literal("c")));
    /// ```
    pub fn partial_deriv(&mut self, e: Lang, c: u32) -> Vec<Lang> {
        match &e.base {
            BaseRx::Empty | BaseRx::Epsilon => Vec::new(),
            BaseRx::Letter(x) => {
                if *x == c {
                    vec![self.epsilon]
                } else {
                    Vec::new()
                }
            }
            BaseRx::Letters(s) => {
                if s.contains(c) {
                    vec![self.epsilon]
                } else {
                    Vec::new()
                }
            }
            &BaseRx::Choice(e1, e2) => {
                let mut v = self.partial_deriv(e1, c);
                v.extend(self.partial_deriv(e2, c));
                dedup_terms(&mut v);
                v
            }
            &BaseRx::Concat(e1, e2) => {
                let mut v = Vec::new();
                for d in self.partial_deriv(e1, c) {
                    if !d.is_empty() {
                        v.push(self.concat(d, e2));
                    }
                }
                if e1.nullable {
                    v.extend(self.partial_deriv(e2, c));
                }
                dedup_terms(&mut v);
                v
            }
            &BaseRx::Star(e1) => {
                let mut v = Vec::new();
                for d in self.partial_deriv(e1, c) {
                    if !d.is_empty() {
                        v.push(self.concat(d, e));
                    }
                }
                dedup_terms(&mut v);
                v
            }
            BaseRx::Repeat(e1, m, n) => {
                let (e1, m, n) = (*e1, *m, *n);
                let ds = self.partial_deriv(e1, c);
                let mut v = Vec::new();
                if !ds.is_empty() {
                    let tail = self.repeat_unchecked(e1, m.saturating_sub(1), n - 1);
                    for d in ds {
                        if !d.is_empty() {
                            v.push(self.concat(d, tail));
                        }
                    }
                }
                dedup_terms(&mut v);
                v
            }
            BaseRx::Var(_) => panic!("internal invariant violated: free recursion variable"),
        }
    }

    /// Derivative of e with respect to a character
    ///
    /// The derivative is the union of the partial-derivative set, built
    /// with [choice_list](Self::choice_list). Results are memoized per
    /// derivative class: the cache is keyed by the smallest character of
    /// the class that contains c.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let abc = rx.literal("abc");
    /// let acc = rx.literal("acc");
    /// let e = rx.choice(abc, acc);
    ///
    /// // e is 'abc + acc'; the derivative of e w.r.t. 'a' is 'bc + cc'
    /// let d = rx.deriv(e, 'a' as u32);
    /// let bc = rx.literal("bc");
    /// let cc = rx.literal("cc");
    /// assert_eq!(d, rx.choice(bc, cc));
    /// ```
    pub fn deriv(&mut self, e: Lang, c: u32) -> Lang {
        debug_assert!(c <= MAX_CHAR);
        let witness = match e.first.iter().find(|s| s.contains(c)) {
            None => return self.empty,
            Some(class) => class.pick(),
        };
        let key = DerivKey(e, witness);
        if let Some(&d) = self.deriv_cache.get(&key) {
            return d;
        }
        let parts = self.partial_deriv(e, witness);
        let d = self.choice_list(parts);
        self.deriv_cache.insert(DerivKey(e, witness), d);
        d
    }

    /// Derivative with respect to a string
    ///
    /// Defined by induction on s: the derivative with respect to the empty
    /// string is e itself; the derivative with respect to c.w is the
    /// derivative of deriv(e, c) with respect to w.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let abc = rx.literal("abc");
    /// let acc = rx.literal("acc");
    /// let e = rx.choice(abc, acc);
    ///
    /// let d = rx.word_derivative(e, "ab");
    /// assert_eq!(d, rx.literal("c"));
    ///
    /// assert_eq!(rx.word_derivative(e, ""), e);
    /// ```
    pub fn word_derivative(&mut self, e: Lang, s: &str) -> Lang {
        let mut r = e;
        for c in s.chars() {
            r = self.deriv(r, c as u32);
        }
        r
    }

    /// Check whether a string belongs to the language of e
    ///
    /// The string is consumed character by character, maintaining the set
    /// of partial-derivative residues; the string is accepted if some
    /// final residue accepts the empty string. Residues are deduplicated
    /// at each step, so memory is bounded by the number of distinct
    /// residues.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.letter('a' as u32);
    /// let b = rx.letter('b' as u32);
    /// let bs = rx.star(b);
    /// let e = rx.concat(a, bs); // ab*
    ///
    /// assert!(rx.accepts(e, "a"));
    /// assert!(rx.accepts(e, "abbbb"));
    /// assert!(!rx.accepts(e, ""));
    /// assert!(!rx.accepts(e, "b"));
    /// ```
    pub fn accepts(&mut self, e: Lang, s: &str) -> bool {
        assert!(!e.has_var, "internal invariant violated: free recursion variable");
        let mut current = vec![e];
        for c in s.chars() {
            let mut next = Vec::new();
            for r in current {
                next.extend(self.partial_deriv(r, c as u32));
            }
            dedup_terms(&mut next);
            if next.is_empty() {
                return false;
            }
            current = next;
        }
        current.iter().any(|r| r.nullable)
    }

    /// Check whether a string does not belong to the language of e
    pub fn rejects(&mut self, e: Lang, s: &str) -> bool {
        !self.accepts(e, s)
    }
}

impl Default for RxManager {
    fn default() -> Self {
        Self::new()
    }
}

/// write one escaped character of a one-character term
fn write_letter(f: &mut std::fmt::Formatter<'_>, x: u32) -> std::fmt::Result {
    match char::from_u32(x) {
        Some(c) if "\\.|*+?()[]{}^$\"".contains(c) => write!(f, "\\{}", c),
        Some(c) if !c.is_control() => write!(f, "{}", c),
        _ => write!(f, "\\u{{{:x}}}", x),
    }
}

/// write a character class in bracket syntax
fn write_class(f: &mut std::fmt::Formatter<'_>, s: &LetterSet) -> std::fmt::Result {
    fn esc(f: &mut std::fmt::Formatter<'_>, x: u32) -> std::fmt::Result {
        match char::from_u32(x) {
            Some(c) if "\\]^-".contains(c) => write!(f, "\\{}", c),
            Some(c) if !c.is_control() => write!(f, "{}", c),
            _ => write!(f, "\\u{{{:x}}}", x),
        }
    }

    write!(f, "[")?;
    for r in s.ranges() {
        esc(f, r.start())?;
        if !r.is_singleton() {
            write!(f, "-")?;
            esc(f, r.end())?;
        }
    }
    write!(f, "]")
}

impl Display for BaseRx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // write a factor of a concatenation: unions need parentheses
        fn write_factor(f: &mut std::fmt::Formatter<'_>, e: Lang) -> std::fmt::Result {
            if matches!(e.base, BaseRx::Choice(..)) {
                write!(f, "({})", e.base)
            } else {
                write!(f, "{}", e.base)
            }
        }

        // write the body of a postfix operator: atoms stand alone
        fn write_tight(f: &mut std::fmt::Formatter<'_>, e: Lang) -> std::fmt::Result {
            match e.base {
                BaseRx::Empty
                | BaseRx::Epsilon
                | BaseRx::Letter(_)
                | BaseRx::Letters(_)
                | BaseRx::Star(_)
                | BaseRx::Repeat(..) => write!(f, "{}", e.base),
                _ => write!(f, "({})", e.base),
            }
        }

        match self {
            BaseRx::Empty => write!(f, "\u{2205}"), // empty set
            BaseRx::Epsilon => write!(f, "\"\""),
            BaseRx::Letter(c) => write_letter(f, *c),
            BaseRx::Letters(s) => write_class(f, s),
            &BaseRx::Choice(e1, e2) => {
                let mut v = Vec::new();
                flatten_choice(e1, &mut v);
                flatten_choice(e2, &mut v);
                for (i, e) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", e.base)?;
                }
                Ok(())
            }
            &BaseRx::Concat(e1, e2) => {
                let mut v = Vec::new();
                flatten_concat(e1, &mut v);
                flatten_concat(e2, &mut v);
                for e in v {
                    write_factor(f, e)?;
                }
                Ok(())
            }
            &BaseRx::Star(e) => {
                write_tight(f, e)?;
                write!(f, "*")
            }
            &BaseRx::Repeat(e, m, n) => {
                write!(f, "(")?;
                write_tight(f, e)?;
                if m == n {
                    write!(f, "{{{}}})", m)
                } else {
                    write!(f, "{{{},{}}})", m, n)
                }
            }
            BaseRx::Var(k) => write!(f, "${}", k),
        }
    }
}

impl Display for Rx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.base.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_atoms(rx: &mut RxManager) -> Vec<Lang> {
        vec![
            rx.empty(),
            rx.epsilon(),
            rx.dot(),
            rx.letter('a' as u32),
            rx.letter('b' as u32),
            rx.range('0' as u32, '9' as u32),
            rx.range('A' as u32, 'Z' as u32),
        ]
    }

    fn check_equal(e1: Lang, e2: Lang) {
        assert_eq!(e1, e2);
        assert_eq!(e1.id, e2.id);
        assert!(std::ptr::eq(e1, e2));
    }

    #[test]
    fn hash_consing() {
        let rx = &mut RxManager::new();

        let v1 = build_atoms(rx);
        let v2 = build_atoms(rx);
        for (i, &t) in v1.iter().enumerate() {
            check_equal(t, v2[i]);
        }

        for &t in &v1 {
            for &u in &v1 {
                let c1 = rx.concat(t, u);
                let c2 = rx.concat(t, u);
                check_equal(c1, c2);
            }
        }
    }

    #[test]
    fn choice_normalization() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let b = rx.letter('b' as u32);
        let empty = rx.empty();
        let ab = rx.literal("ab");
        let cd = rx.literal("cd");

        // identity and idempotence
        check_equal(rx.choice(ab, empty), ab);
        check_equal(rx.choice(empty, ab), ab);
        check_equal(rx.choice(ab, ab), ab);
        check_equal(rx.choice(empty, empty), empty);

        // commutativity and associativity after sorting
        let u1 = rx.choice(ab, cd);
        let u2 = rx.choice(cd, ab);
        check_equal(u1, u2);
        let t1 = {
            let x = rx.choice(ab, cd);
            let ba = rx.literal("ba");
            rx.choice(x, ba)
        };
        let t2 = {
            let ba = rx.literal("ba");
            let x = rx.choice(cd, ba);
            rx.choice(ab, x)
        };
        check_equal(t1, t2);

        // letter fusion
        let fused = rx.choice(a, b);
        check_equal(fused, rx.range('a' as u32, 'b' as u32));
        let digits = rx.range('0' as u32, '9' as u32);
        let more = rx.choice(digits, a);
        assert!(matches!(more.base, BaseRx::Letters(_)));
    }

    #[test]
    fn concat_normalization() {
        let rx = &mut RxManager::new();
        let empty = rx.empty();
        let eps = rx.epsilon();
        let ab = rx.literal("ab");
        let cd = rx.literal("cd");

        check_equal(rx.concat(ab, empty), empty);
        check_equal(rx.concat(empty, ab), empty);
        check_equal(rx.concat(ab, eps), ab);
        check_equal(rx.concat(eps, ab), ab);

        // associativity via right-nesting
        let l1 = {
            let x = rx.concat(ab, cd);
            rx.concat(x, ab)
        };
        let l2 = {
            let y = rx.concat(cd, ab);
            rx.concat(ab, y)
        };
        check_equal(l1, l2);
    }

    #[test]
    fn star_normalization() {
        let rx = &mut RxManager::new();
        let empty = rx.empty();
        let eps = rx.epsilon();
        let ab = rx.literal("ab");

        check_equal(rx.star(empty), eps);
        check_equal(rx.star(eps), eps);
        let s = rx.star(ab);
        check_equal(rx.star(s), s);
    }

    #[test]
    fn repeat_normalization() {
        let rx = &mut RxManager::new();
        let eps = rx.epsilon();
        let empty = rx.empty();
        let a = rx.letter('a' as u32);

        check_equal(rx.repeat(a, 0, 0).unwrap(), eps);
        check_equal(rx.repeat(a, 1, 1).unwrap(), a);
        check_equal(rx.repeat(empty, 0, 3).unwrap(), eps);
        check_equal(rx.repeat(empty, 1, 3).unwrap(), empty);
        check_equal(rx.repeat(eps, 2, 5).unwrap(), eps);
        check_equal(rx.pow(a, -3), eps);
        check_equal(rx.pow(a, 0), eps);
        check_equal(rx.pow(a, 1), a);

        assert_eq!(rx.repeat(a, -1, 2), Err(Error::InvalidArgument(-1, 2)));
        assert_eq!(rx.repeat(a, 3, 2), Err(Error::InvalidArgument(3, 2)));
    }

    #[test]
    fn nullability() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let bs = {
            let b = rx.letter('b' as u32);
            rx.star(b)
        };

        assert!(!rx.empty().nullable);
        assert!(rx.epsilon().nullable);
        assert!(!a.nullable);
        assert!(bs.nullable);
        assert!(!rx.concat(a, bs).nullable);
        assert!(rx.choice(a, bs).nullable);
        assert!(rx.repeat(a, 0, 3).unwrap().nullable);
        assert!(!rx.repeat(a, 2, 3).unwrap().nullable);
    }

    #[test]
    fn strict_shape_checks() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let eps = rx.epsilon();
        let empty = rx.empty();
        let a_star = rx.star(a);

        assert!(empty.is_empty() && !empty.is_epsilon());
        assert!(eps.is_epsilon() && !eps.is_empty());
        assert!(!a.is_empty() && !a.is_epsilon());
        assert!(!a_star.is_empty() && !a_star.is_epsilon());
    }

    #[test]
    fn first_sets() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let b = rx.letter('b' as u32);
        let a_star = rx.star(a);

        assert!(rx.empty().first_set().is_empty());
        assert!(rx.epsilon().first_set().is_empty());
        assert_eq!(a.first_set(), &[LetterSet::singleton('a' as u32)]);

        // concat with a non-nullable head only sees the head
        let ab = rx.concat(a, b);
        assert_eq!(ab.first_set(), &[LetterSet::singleton('a' as u32)]);

        // concat with a nullable head merges both sides
        let e = rx.concat(a_star, b);
        let first = e.first_set();
        assert_eq!(first.len(), 2);
        assert!(first.contains(&LetterSet::singleton('a' as u32)));
        assert!(first.contains(&LetterSet::singleton('b' as u32)));

        // pairwise disjoint even with overlapping branches
        let r1 = rx.range('a' as u32, 'k' as u32);
        let r2 = rx.range('f' as u32, 'z' as u32);
        let x = rx.literal("x");
        let left = rx.concat(r1, x);
        let right = rx.concat(r2, x);
        let u = rx.choice(left, right);
        let first = u.first_set();
        for (i, s) in first.iter().enumerate() {
            for t in &first[i + 1..] {
                assert!(s.is_disjoint(t));
            }
        }
        let mut covered = LetterSet::empty();
        for s in first {
            covered = covered.union(s);
        }
        assert_eq!(covered, LetterSet::range('a' as u32, 'z' as u32));
    }

    #[test]
    fn match_sizes() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let b = rx.letter('b' as u32);

        assert_eq!(rx.empty().match_sizes(), None);
        assert_eq!(rx.epsilon().match_sizes(), Some((Size::ZERO, Size::ZERO)));
        assert_eq!(a.match_sizes(), Some((Size::ONE, Size::ONE)));

        // ab* has sizes (1, inf)
        let bs = rx.star(b);
        let e = rx.concat(a, bs);
        assert_eq!(e.match_sizes(), Some((Size::ONE, Size::Unbounded)));

        // a{2,4} has sizes (2, 4)
        let r = rx.repeat(a, 2, 4).unwrap();
        assert_eq!(r.match_sizes(), Some((Size::Finite(2), Size::Finite(4))));

        // choice takes the envelope
        let c = rx.choice(e, r);
        assert_eq!(c.match_sizes(), Some((Size::ONE, Size::Unbounded)));

        // concatenation with the empty language has no sizes
        let dead = {
            let empty = rx.empty();
            rx.make(BaseRx::Concat(a, empty))
        };
        assert_eq!(dead.match_sizes(), None);
    }

    #[test]
    fn partial_derivatives() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let b = rx.letter('b' as u32);
        let eps = rx.epsilon();

        assert!(rx.partial_deriv(eps, 'a' as u32).is_empty());
        let e = rx.empty();
        assert!(rx.partial_deriv(e, 'a' as u32).is_empty());
        assert_eq!(rx.partial_deriv(a, 'a' as u32), vec![eps]);
        assert!(rx.partial_deriv(a, 'b' as u32).is_empty());

        // star: d(a*) w.r.t. a = {a*}
        let a_star = rx.star(a);
        assert_eq!(rx.partial_deriv(a_star, 'a' as u32), vec![a_star]);

        // concat: d(ab*) w.r.t. a = {b*}
        let bs = rx.star(b);
        let e = rx.concat(a, bs);
        assert_eq!(rx.partial_deriv(e, 'a' as u32), vec![bs]);

        // repeat counts down
        let r = rx.repeat(a, 2, 4).unwrap();
        let tail = rx.repeat(a, 1, 3).unwrap();
        assert_eq!(rx.partial_deriv(r, 'a' as u32), vec![tail]);
        let one = rx.repeat(a, 1, 1).unwrap();
        assert_eq!(rx.partial_deriv(one, 'a' as u32), vec![eps]);
    }

    #[test]
    fn derivative_classes_share_results() {
        let rx = &mut RxManager::new();
        let digits = rx.range('0' as u32, '9' as u32);
        let x = rx.literal("x");
        let e = rx.concat(digits, x);

        let d0 = rx.deriv(e, '0' as u32);
        let d7 = rx.deriv(e, '7' as u32);
        check_equal(d0, d7);
        check_equal(d0, x);

        // outside every class the derivative is empty
        let d = rx.deriv(e, 'z' as u32);
        check_equal(d, rx.empty());
    }

    #[test]
    fn membership() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);
        let b = rx.letter('b' as u32);

        // ab*
        let bs = rx.star(b);
        let e = rx.concat(a, bs);
        assert!(rx.accepts(e, "a"));
        assert!(rx.accepts(e, "abbbb"));
        assert!(!rx.accepts(e, ""));
        assert!(!rx.accepts(e, "b"));
        assert!(rx.rejects(e, "ba"));

        // a{2,4}
        let r = rx.repeat(a, 2, 4).unwrap();
        assert!(!rx.accepts(r, "a"));
        assert!(rx.accepts(r, "aa"));
        assert!(rx.accepts(r, "aaaa"));
        assert!(!rx.accepts(r, "aaaaa"));

        // nullability agrees with accepting the empty string
        for &t in &build_atoms(rx) {
            assert_eq!(t.nullable, rx.accepts(t, ""));
        }
    }

    #[test]
    fn display_forms() {
        let rx = &mut RxManager::new();
        let a = rx.letter('a' as u32);

        assert_eq!(rx.empty().to_string(), "\u{2205}");
        assert_eq!(rx.epsilon().to_string(), "\"\"");
        assert_eq!(a.to_string(), "a");

        let ab = rx.literal("ab");
        assert_eq!(ab.to_string(), "ab");

        let x = rx.letter('x' as u32);
        let u = rx.choice(a, x);
        assert_eq!(u.to_string(), "[ax]");

        let cd = rx.literal("cd");
        let u2 = rx.choice(ab, cd);
        assert_eq!(u2.to_string(), "ab|cd");

        let s = rx.star(ab);
        assert_eq!(s.to_string(), "(ab)*");
        let sa = rx.star(a);
        assert_eq!(sa.to_string(), "a*");

        let r = rx.repeat(a, 2, 4).unwrap();
        assert_eq!(r.to_string(), "(a{2,4})");
        let p = rx.pow(a, 3);
        assert_eq!(p.to_string(), "(a{3})");

        let dot = rx.letter('.' as u32);
        assert_eq!(dot.to_string(), "\\.");

        let mix = rx.concat(u2, s);
        assert_eq!(mix.to_string(), "(ab|cd)(ab)*");
    }
}
