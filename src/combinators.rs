// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Boolean set algebra over regular languages
//!
//! Intersection, difference, and symmetric difference are computed as
//! terms, not decided as predicates: each procedure unfolds the pair
//! automaton induced by derivatives and closes the resulting system of
//! language equations with Arden's rule (if X = R·X + B and R is not
//! nullable, then X = R*·B).
//!
//! The unfolding allocates a fresh recursion marker per visited pair.
//! A pair reached again on the active recursion path contributes its
//! marker instead of unfolding further; markers of enclosing activations
//! appear free in inner results and are eliminated by the enclosing
//! [resolve][RxManager] step, which only extracts the marker of its own
//! level. No marker survives the outermost call.
//!
//! Canonicalization reconstructs a term from its derivative automaton
//! with the same machinery, producing a representative that is
//! structurally equal for equivalent inputs.
//!

use std::collections::HashMap;

use crate::letter_sets::{venn, LetterSet, VennClass};
use crate::terms::{BaseRx, Lang, RxManager};

type PairEnv = HashMap<(usize, usize), Lang>;

impl RxManager {
    /// Intersection of two languages
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let r = rx.range('a' as u32, 'c' as u32);
    /// let s = rx.range('b' as u32, 'd' as u32);
    /// let i = rx.inter(r, s);
    ///
    /// assert!(rx.accepts(i, "b"));
    /// assert!(rx.accepts(i, "c"));
    /// assert!(!rx.accepts(i, "a"));
    /// assert!(!rx.accepts(i, "d"));
    /// ```
    pub fn inter(&mut self, e1: Lang, e2: Lang) -> Lang {
        assert!(
            !e1.has_var() && !e2.has_var(),
            "internal invariant violated: free recursion variable"
        );
        let mut env = PairEnv::new();
        let r = self.inter_rec(e1, e2, 1, &mut env);
        debug_assert!(!r.has_var());
        r
    }

    fn inter_rec(&mut self, e1: Lang, e2: Lang, cnt: u32, env: &mut PairEnv) -> Lang {
        if e1.is_empty() || e2.is_empty() {
            return self.empty();
        }
        if e1.is_epsilon() {
            return if e2.nullable { self.epsilon() } else { self.empty() };
        }
        if e2.is_epsilon() {
            return if e1.nullable { self.epsilon() } else { self.empty() };
        }
        if e1 == e2 {
            return e1;
        }
        let key = (e1.id(), e2.id());
        if let Some(&v) = env.get(&key) {
            return v;
        }
        let var = self.var(cnt);
        env.insert(key, var);
        let classes = venn(e1.first_set(), e2.first_set());
        let mut parts = Vec::new();
        for p in &classes {
            // only characters both sides can start with survive
            if let VennClass::Both(cs) = p {
                let w = cs.pick();
                let d1 = self.deriv(e1, w);
                let d2 = self.deriv(e2, w);
                let tail = self.inter_rec(d1, d2, cnt + 1, env);
                let head = self.letters(cs.clone());
                parts.push(self.concat(head, tail));
            }
        }
        if e1.nullable && e2.nullable {
            parts.push(self.epsilon());
        }
        env.remove(&key);
        let body = self.choice_list(parts);
        self.resolve(body, cnt)
    }

    /// Difference of two languages (strings of e1 not in e2)
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let r = rx.range('a' as u32, 'c' as u32);
    /// let s = rx.range('b' as u32, 'd' as u32);
    /// let d = rx.diff(r, s);
    ///
    /// assert!(rx.accepts(d, "a"));
    /// assert!(!rx.accepts(d, "b"));
    /// assert!(!rx.accepts(d, "d"));
    /// ```
    pub fn diff(&mut self, e1: Lang, e2: Lang) -> Lang {
        assert!(
            !e1.has_var() && !e2.has_var(),
            "internal invariant violated: free recursion variable"
        );
        let mut env = PairEnv::new();
        let r = self.diff_rec(e1, e2, 1, &mut env);
        debug_assert!(!r.has_var());
        r
    }

    fn diff_rec(&mut self, e1: Lang, e2: Lang, cnt: u32, env: &mut PairEnv) -> Lang {
        if e1.is_empty() {
            return self.empty();
        }
        if e2.is_empty() {
            return e1;
        }
        if e1 == e2 {
            return self.empty();
        }
        if e1.is_epsilon() {
            return if e2.nullable { self.empty() } else { self.epsilon() };
        }
        let key = (e1.id(), e2.id());
        if let Some(&v) = env.get(&key) {
            return v;
        }
        let var = self.var(cnt);
        env.insert(key, var);
        let classes = venn(e1.first_set(), e2.first_set());
        let mut parts = Vec::new();
        for p in &classes {
            // keep the classes e1 can start with; where e2 cannot follow,
            // the recursion bottoms out at 'd1 - empty'
            let cs = match p {
                VennClass::Both(cs) | VennClass::Left(cs) => cs,
                VennClass::Right(_) => continue,
            };
            let w = cs.pick();
            let d1 = self.deriv(e1, w);
            let d2 = self.deriv(e2, w);
            let tail = self.diff_rec(d1, d2, cnt + 1, env);
            let head = self.letters(cs.clone());
            parts.push(self.concat(head, tail));
        }
        if e1.nullable && !e2.nullable {
            parts.push(self.epsilon());
        }
        env.remove(&key);
        let body = self.choice_list(parts);
        self.resolve(body, cnt)
    }

    /// Symmetric difference of two languages
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let r = rx.range('a' as u32, 'c' as u32);
    /// let s = rx.range('b' as u32, 'd' as u32);
    /// let x = rx.xor(r, s);
    ///
    /// assert!(rx.accepts(x, "a"));
    /// assert!(rx.accepts(x, "d"));
    /// assert!(!rx.accepts(x, "b"));
    /// assert!(!rx.accepts(x, "c"));
    /// ```
    pub fn xor(&mut self, e1: Lang, e2: Lang) -> Lang {
        assert!(
            !e1.has_var() && !e2.has_var(),
            "internal invariant violated: free recursion variable"
        );
        let mut env = PairEnv::new();
        let r = self.xor_rec(e1, e2, 1, &mut env);
        debug_assert!(!r.has_var());
        r
    }

    fn xor_rec(&mut self, e1: Lang, e2: Lang, cnt: u32, env: &mut PairEnv) -> Lang {
        if e1.is_empty() {
            return e2;
        }
        if e2.is_empty() {
            return e1;
        }
        if e1 == e2 {
            return self.empty();
        }
        if e1.is_epsilon() && !e2.nullable {
            let eps = self.epsilon();
            return self.choice(e2, eps);
        }
        if e2.is_epsilon() && !e1.nullable {
            let eps = self.epsilon();
            return self.choice(e1, eps);
        }
        let key = (e1.id(), e2.id());
        if let Some(&v) = env.get(&key) {
            return v;
        }
        let var = self.var(cnt);
        env.insert(key, var);
        let classes = venn(e1.first_set(), e2.first_set());
        let mut parts = Vec::new();
        for p in &classes {
            let cs = p.set().clone();
            let w = cs.pick();
            let d1 = self.deriv(e1, w);
            let d2 = self.deriv(e2, w);
            let tail = self.xor_rec(d1, d2, cnt + 1, env);
            let head = self.letters(cs);
            parts.push(self.concat(head, tail));
        }
        if e1.nullable != e2.nullable {
            parts.push(self.epsilon());
        }
        env.remove(&key);
        let body = self.choice_list(parts);
        self.resolve(body, cnt)
    }

    /// Complement of a language
    ///
    /// Defined as the difference between the universe and e.
    ///
    /// # Example
    ///
    /// ```
    /// use rx_algebra::terms::*;
    ///
    /// let rx = &mut RxManager::new();
    /// let a = rx.letter('a' as u32);
    /// let a_star = rx.star(a);
    /// let c = rx.complement(a_star);
    ///
    /// assert!(rx.accepts(c, "b"));
    /// assert!(rx.accepts(c, "ab"));
    /// assert!(!rx.accepts(c, ""));
    /// assert!(!rx.accepts(c, "aa"));
    /// ```
    pub fn complement(&mut self, e: Lang) -> Lang {
        let u = self.universe();
        self.diff(u, e)
    }

    /// Canonical representative of a language
    ///
    /// The result denotes the same language as e, and two equivalent
    /// inputs produce the same term. The representative is rebuilt from
    /// the derivative automaton, so it is often larger than the input,
    /// not smaller.
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
    /// let aa = rx.literal("aa");
    /// let aa_star = rx.star(aa);
    /// let odd = rx.concat(aa_star, a);
    /// let s = rx.choice(aa_star, odd);
    ///
    /// // equivalent inputs canonicalize to the same object
    /// let c1 = rx.canonical(a_star);
    /// let c2 = rx.canonical(s);
    /// assert!(std::ptr::eq(c1, c2));
    /// ```
    pub fn canonical(&mut self, e: Lang) -> Lang {
        assert!(
            !e.has_var(),
            "internal invariant violated: free recursion variable"
        );
        let mut env = Vec::new();
        let r = self.canon_rec(e, 1, &mut env);
        debug_assert!(!r.has_var());
        r
    }

    fn canon_rec(&mut self, e: Lang, cnt: u32, env: &mut Vec<(Lang, Lang)>) -> Lang {
        // the seen-check is up to equivalence, so that equivalent inputs
        // walk isomorphic state graphs
        for i in 0..env.len() {
            let (seen, var) = env[i];
            if seen == e || self.equiv(seen, e) {
                return var;
            }
        }
        let var = self.var(cnt);
        env.push((e, var));
        // classes whose successors rebuild identically are fused
        let classes: Vec<LetterSet> = e.first_set().to_vec();
        let mut groups: Vec<(Lang, LetterSet)> = Vec::new();
        for cs in classes {
            let w = cs.pick();
            let d = self.deriv(e, w);
            let tail = self.canon_rec(d, cnt + 1, env);
            match groups.iter_mut().find(|(t, _)| *t == tail) {
                Some((_, set)) => *set = set.union(&cs),
                None => groups.push((tail, cs)),
            }
        }
        groups.sort_by_key(|(_, set)| set.min());
        let mut parts = Vec::new();
        for (tail, set) in groups {
            let head = self.letters(set);
            parts.push(self.concat(head, tail));
        }
        if e.nullable {
            parts.push(self.epsilon());
        }
        env.pop();
        let body = self.choice_list(parts);
        self.resolve(body, cnt)
    }

    //
    // ARDEN CLOSURE
    //

    /// Concatenation lifted to optional terms (None is the empty language)
    fn concat_opt(&mut self, a: Option<Lang>, b: Option<Lang>) -> Option<Lang> {
        match (a, b) {
            (Some(x), Some(y)) => Some(self.concat(x, y)),
            _ => None,
        }
    }

    /// Union lifted to optional terms (None is the empty language)
    fn choice_opt(&mut self, a: Option<Lang>, b: Option<Lang>) -> Option<Lang> {
        match (a, b) {
            (Some(x), Some(y)) => Some(self.choice(x, y)),
            (Some(x), None) | (None, Some(x)) => Some(x),
            (None, None) => None,
        }
    }

    /// Split e as R·Var(k) + B
    ///
    /// Return (R, B) where None stands for the empty language. Markers
    /// other than Var(k) belong to enclosing activations and stay in B.
    fn split(&mut self, e: Lang, k: u32) -> (Option<Lang>, Option<Lang>) {
        if !e.has_var() {
            return (None, Some(e));
        }
        match e.base() {
            &BaseRx::Var(j) if j == k => (Some(self.epsilon()), None),
            &BaseRx::Concat(x, y) => {
                let (r1, b1) = self.split(x, k);
                let (r2, b2) = self.split(y, k);
                let rr = self.concat_opt(r1, r2);
                let rb = self.concat_opt(r1, b2);
                let br = self.concat_opt(b1, r2);
                let r = self.choice_opt(rr, rb);
                let r = self.choice_opt(r, br);
                let b = self.concat_opt(b1, b2);
                (r, b)
            }
            &BaseRx::Choice(x, y) => {
                let (r1, b1) = self.split(x, k);
                let (r2, b2) = self.split(y, k);
                let r = self.choice_opt(r1, r2);
                let b = self.choice_opt(b1, b2);
                (r, b)
            }
            _ => (None, Some(e)),
        }
    }

    /// Solve e = R·Var(k) + B by Arden's rule, giving R*·B
    pub(crate) fn resolve(&mut self, e: Lang, k: u32) -> Lang {
        let (r, b) = self.split(e, k);
        match (r, b) {
            (_, None) => self.empty(),
            (None, Some(b)) => b,
            (Some(r), Some(b)) => {
                let s = self.star(r);
                self.concat(s, b)
            }
        }
    }
}
