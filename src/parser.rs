// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Parser for the textual surface syntax
//!
//! The grammar is a small classical regex dialect:
//!
//! ```text
//!   alternation    := concatenation ('|' concatenation)*
//!   concatenation  := postfix*
//!   postfix        := atom ('*' | '+' | '?' | '{' bounds '}')*
//!   atom           := literal | '.' | '\' escaped | '(' alternation ')' | class
//!   class          := '[' '^'? member+ ']'
//!   member         := classchar ('-' classchar)?
//!   bounds         := number | number ',' | number ',' number
//! ```
//!
//! The empty pattern denotes the empty string. There are no anchors,
//! capture groups, or backreferences; parentheses only group.
//!

use crate::errors::{Error, ParseError};
use crate::letter_sets::LetterSet;
use crate::terms::{Lang, RxManager};

/// Parse a pattern into a regular expression term
///
/// # Errors
///
/// Return [Error::Parse] when the pattern is not well formed. Offsets in
/// the error refer to character positions in the pattern.
///
/// # Example
///
/// ```
/// use rx_algebra::terms::*;
/// use rx_algebra::parser;
///
/// let rx = &mut RxManager::new();
/// let e = parser::parse(rx, "a{2,4}").unwrap();
///
/// assert!(!rx.accepts(e, "a"));
/// assert!(rx.accepts(e, "aaa"));
/// assert!(parser::parse(rx, "a{4,2}").is_err());
/// ```
pub fn parse(rx: &mut RxManager, pattern: &str) -> Result<Lang, Error> {
    let mut p = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
    };
    let e = p.alternation(rx)?;
    match p.peek() {
        None => Ok(e),
        Some(')') => Err(ParseError::UnbalancedGroup(p.pos).into()),
        Some(c) => Err(ParseError::UnexpectedChar(c, p.pos).into()),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn alternation(&mut self, rx: &mut RxManager) -> Result<Lang, ParseError> {
        let mut e = self.concatenation(rx)?;
        while self.eat('|') {
            let r = self.concatenation(rx)?;
            e = rx.choice(e, r);
        }
        Ok(e)
    }

    fn concatenation(&mut self, rx: &mut RxManager) -> Result<Lang, ParseError> {
        let mut factors = Vec::new();
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                _ => factors.push(self.postfix(rx)?),
            }
        }
        let mut e = rx.epsilon();
        for &x in factors.iter().rev() {
            e = rx.concat(x, e);
        }
        Ok(e)
    }

    fn postfix(&mut self, rx: &mut RxManager) -> Result<Lang, ParseError> {
        let mut e = self.atom(rx)?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    e = rx.star(e);
                }
                Some('+') => {
                    self.pos += 1;
                    e = rx.plus(e);
                }
                Some('?') => {
                    self.pos += 1;
                    e = rx.opt(e);
                }
                Some('{') => {
                    let at = self.pos;
                    self.pos += 1;
                    let (m, n) = self.bounds(at)?;
                    e = match n {
                        Some(n) => rx
                            .repeat(e, m as i64, n as i64)
                            .map_err(|_| ParseError::BadRepetition(at))?,
                        // open-ended: m copies followed by any number more
                        None => {
                            let head = rx.pow(e, m as i64);
                            let tail = rx.star(e);
                            rx.concat(head, tail)
                        }
                    };
                }
                _ => break,
            }
        }
        Ok(e)
    }

    fn atom(&mut self, rx: &mut RxManager) -> Result<Lang, ParseError> {
        let at = self.pos;
        match self.bump() {
            None => Err(ParseError::UnexpectedEnd),
            Some('(') => {
                let e = self.alternation(rx)?;
                if self.eat(')') {
                    Ok(e)
                } else {
                    Err(ParseError::UnbalancedGroup(at))
                }
            }
            Some('[') => self.class(rx, at),
            Some('.') => Ok(rx.dot()),
            Some('\\') => {
                let c = self.escaped()?;
                Ok(rx.letter(c as u32))
            }
            Some(c @ ('*' | '+' | '?' | '{')) => Err(ParseError::DanglingPostfix(c, at)),
            Some(')') | Some('|') => Err(ParseError::UnexpectedChar(self.chars[at], at)),
            Some(c) => Ok(rx.letter(c as u32)),
        }
    }

    fn escaped(&mut self) -> Result<char, ParseError> {
        match self.bump() {
            None => Err(ParseError::UnexpectedEnd),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some(c) => Ok(c),
        }
    }

    fn class(&mut self, rx: &mut RxManager, at: usize) -> Result<Lang, ParseError> {
        let negated = self.eat('^');
        let mut set = LetterSet::empty();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnbalancedGroup(at)),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    let lo_at = self.pos;
                    let lo = self.class_char()?;
                    // 'a-b' is a range unless the dash closes the class
                    if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                        self.pos += 1;
                        let hi = self.class_char()?;
                        if hi < lo {
                            return Err(ParseError::ReversedClassRange(lo_at));
                        }
                        set = set.union(&LetterSet::range(lo as u32, hi as u32));
                    } else {
                        set = set.union(&LetterSet::singleton(lo as u32));
                    }
                }
            }
        }
        if set.is_empty() {
            return Err(ParseError::EmptyClass(at));
        }
        if negated {
            set = LetterSet::full().diff(&set);
        }
        Ok(rx.letters(set))
    }

    fn class_char(&mut self) -> Result<char, ParseError> {
        match self.bump() {
            None => Err(ParseError::UnexpectedEnd),
            Some('\\') => self.escaped(),
            Some(c) => Ok(c),
        }
    }

    fn bounds(&mut self, at: usize) -> Result<(u32, Option<u32>), ParseError> {
        let m = self.number(at)?;
        if self.eat('}') {
            return Ok((m, Some(m)));
        }
        if !self.eat(',') {
            return Err(ParseError::BadRepetition(at));
        }
        if self.eat('}') {
            return Ok((m, None));
        }
        let n = self.number(at)?;
        if !self.eat('}') {
            return Err(ParseError::BadRepetition(at));
        }
        if n < m {
            return Err(ParseError::BadRepetition(at));
        }
        Ok((m, Some(n)))
    }

    fn number(&mut self, at: usize) -> Result<u32, ParseError> {
        let mut value: u32 = 0;
        let mut any = false;
        while let Some(c) = self.peek() {
            match c.to_digit(10) {
                None => break,
                Some(d) => {
                    self.pos += 1;
                    any = true;
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(d))
                        .ok_or(ParseError::BadRepetition(at))?;
                }
            }
        }
        if any {
            Ok(value)
        } else {
            Err(ParseError::BadRepetition(at))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseError;

    fn accepts(rx: &mut RxManager, pattern: &str, s: &str) -> bool {
        let e = parse(rx, pattern).unwrap();
        rx.accepts(e, s)
    }

    #[test]
    fn atoms() {
        let rx = &mut RxManager::new();

        let eps = parse(rx, "").unwrap();
        assert_eq!(eps, rx.epsilon());

        let a = parse(rx, "a").unwrap();
        assert_eq!(a, rx.letter('a' as u32));

        let dot = parse(rx, ".").unwrap();
        assert_eq!(dot, rx.dot());

        let esc = parse(rx, "\\*").unwrap();
        assert_eq!(esc, rx.letter('*' as u32));

        let nl = parse(rx, "\\n").unwrap();
        assert_eq!(nl, rx.letter('\n' as u32));
    }

    #[test]
    fn operators() {
        let rx = &mut RxManager::new();

        let e = parse(rx, "ab*").unwrap();
        let expected = {
            let a = rx.letter('a' as u32);
            let b = rx.letter('b' as u32);
            let bs = rx.star(b);
            rx.concat(a, bs)
        };
        assert_eq!(e, expected);

        let u = parse(rx, "ab|cd").unwrap();
        let expected = {
            let ab = rx.literal("ab");
            let cd = rx.literal("cd");
            rx.choice(ab, cd)
        };
        assert_eq!(u, expected);

        let star = parse(rx, "(ab)*").unwrap();
        let expected = {
            let ab = rx.literal("ab");
            rx.star(ab)
        };
        assert_eq!(star, expected);

        let plus = parse(rx, "a+").unwrap();
        let expected = {
            let a = rx.letter('a' as u32);
            rx.plus(a)
        };
        assert_eq!(plus, expected);

        let opt = parse(rx, "a?").unwrap();
        let expected = {
            let a = rx.letter('a' as u32);
            rx.opt(a)
        };
        assert_eq!(opt, expected);
    }

    #[test]
    fn repetitions() {
        let rx = &mut RxManager::new();

        let e = parse(rx, "a{2,4}").unwrap();
        let expected = {
            let a = rx.letter('a' as u32);
            rx.repeat(a, 2, 4).unwrap()
        };
        assert_eq!(e, expected);

        assert!(accepts(rx, "a{3}", "aaa"));
        assert!(!accepts(rx, "a{3}", "aa"));

        assert!(accepts(rx, "a{2,}", "aa"));
        assert!(accepts(rx, "a{2,}", "aaaaa"));
        assert!(!accepts(rx, "a{2,}", "a"));
    }

    #[test]
    fn classes() {
        let rx = &mut RxManager::new();

        let e = parse(rx, "[a-c]").unwrap();
        assert_eq!(e, rx.range('a' as u32, 'c' as u32));

        let multi = parse(rx, "[a-cx]").unwrap();
        assert!(rx.accepts(multi, "b"));
        assert!(rx.accepts(multi, "x"));
        assert!(!rx.accepts(multi, "d"));

        let neg = parse(rx, "[^a-c]").unwrap();
        assert!(!rx.accepts(neg, "b"));
        assert!(rx.accepts(neg, "z"));
        assert!(!rx.accepts(neg, "bz"));

        // a trailing dash is a member, not a range
        let dash = parse(rx, "[a-]").unwrap();
        assert!(rx.accepts(dash, "-"));
        assert!(rx.accepts(dash, "a"));
    }

    #[test]
    fn end_to_end() {
        let rx = &mut RxManager::new();

        assert!(accepts(rx, "(ab|cd)*", "abcdab"));
        assert!(!accepts(rx, "(ab|cd)*", "abc"));
        assert!(accepts(rx, "a(b|c)d", "acd"));
        assert!(accepts(rx, "[0-9]+\\.[0-9]+", "3.14"));
        assert!(!accepts(rx, "[0-9]+\\.[0-9]+", "3."));
    }

    #[test]
    fn parse_errors() {
        let rx = &mut RxManager::new();

        let mut err = |p: &str| match parse(rx, p) {
            Err(Error::Parse(e)) => e,
            other => panic!("expected a parse error for {:?}, got {:?}", p, other),
        };

        assert_eq!(err("(ab"), ParseError::UnbalancedGroup(0));
        assert_eq!(err("ab)"), ParseError::UnbalancedGroup(2));
        assert_eq!(err("*a"), ParseError::DanglingPostfix('*', 0));
        assert_eq!(err("a{4,2}"), ParseError::BadRepetition(1));
        assert_eq!(err("a{}"), ParseError::BadRepetition(1));
        assert_eq!(err("[]"), ParseError::EmptyClass(0));
        assert_eq!(err("[z-a]"), ParseError::ReversedClassRange(1));
        assert_eq!(err("[abc"), ParseError::UnbalancedGroup(0));
        assert_eq!(err("a\\"), ParseError::UnexpectedEnd);
    }
}
