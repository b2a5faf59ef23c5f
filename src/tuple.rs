// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable fixed-length sequences of values, carrying a structural
//! hash and (when read from source) the range they were read from.

//! A tuple only comes into existence through [TupleBuilder::end] or
//! [from_slice], both of which compute the hash, so the cached hash
//! is always valid.

use crate::algebra;
use crate::pos::SourceRange;
use crate::value::{Parenkind, Value};
use std::cmp::Ordering;

/// djb2 over the element hashes, wrapping at 32 bits.
pub fn calc_hash(values: &[Value]) -> i32 {
    let mut hash: u32 = 5381;
    for v in values {
        hash = (hash << 5).wrapping_add(hash)
            .wrapping_add(algebra::hash(v) as u32);
    }
    hash as i32
}

/// Which delimiters a tuple was written with. Does not take part in
/// hashing, equality or ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TupleFlags {
    pub paren: Parenkind,
    /// Written with a leading `@`.
    pub at: bool,
}

#[derive(Debug)]
pub struct Tuple {
    hash: i32,
    flags: TupleFlags,
    source: Option<SourceRange>,
    items: Box<[Value]>,
}

#[derive(Debug)]
pub struct TupleBuilder {
    flags: TupleFlags,
    source: Option<SourceRange>,
    items: Vec<Value>,
}

/// Start a tuple of `length` elements, all `nil` until set.
pub fn begin(length: usize) -> TupleBuilder {
    TupleBuilder {
        flags: TupleFlags::default(),
        source: None,
        items: vec![Value::Nil; length],
    }
}

pub fn from_slice(values: &[Value]) -> Tuple {
    TupleBuilder {
        flags: TupleFlags::default(),
        source: None,
        items: values.to_vec(),
    }.end()
}

impl TupleBuilder {
    /// Panics if `index` is out of range, like slice indexing.
    pub fn set(&mut self, index: usize, value: Value) {
        self.items[index] = value;
    }

    pub fn as_mut_slice(&mut self) -> &mut [Value] {
        &mut self.items
    }

    pub fn flags(mut self, flags: TupleFlags) -> TupleBuilder {
        self.flags = flags;
        self
    }

    pub fn source(mut self, range: SourceRange) -> TupleBuilder {
        self.source = Some(range);
        self
    }

    pub fn end(self) -> Tuple {
        Tuple {
            hash: calc_hash(&self.items),
            flags: self.flags,
            source: self.source,
            items: self.items.into_boxed_slice(),
        }
    }
}

impl Tuple {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn hash(&self) -> i32 {
        self.hash
    }

    pub fn flags(&self) -> TupleFlags {
        self.flags
    }

    pub fn source(&self) -> Option<SourceRange> {
        self.source
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Element-wise. Hash and length only serve to reject early.
    pub fn equal(&self, other: &Tuple) -> bool {
        if std::ptr::eq(self, other) {
            return true
        }
        if self.hash != other.hash || self.len() != other.len() {
            return false
        }
        self.items.iter().zip(other.items.iter())
            .all(|(a, b)| algebra::equal(a, b))
    }

    /// Element-wise; a proper prefix sorts first.
    pub fn compare(&self, other: &Tuple) -> Ordering {
        for (a, b) in self.items.iter().zip(other.items.iter()) {
            match algebra::compare(a, b) {
                Ordering::Equal => {}
                o => return o,
            }
        }
        self.len().cmp(&other.len())
    }
}

impl<'t> IntoIterator for &'t Tuple {
    type Item = &'t Value;
    type IntoIter = std::slice::Iter<'t, Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::Pos;

    fn nums(ns: &[f64]) -> Tuple {
        from_slice(&ns.iter().map(|n| Value::Number(*n)).collect::<Vec<_>>())
    }

    #[test]
    fn builder_fills_and_hashes() {
        let mut b = begin(2);
        b.set(0, Value::Number(1.0));
        b.as_mut_slice()[1] = Value::symbol("x");
        let range = SourceRange {
            start: Pos::default(),
            end: Pos { offset: 5, line: 0, col: 5 },
        };
        let t = b.source(range).end();
        assert_eq!(t.len(), 2);
        assert_eq!(t.source(), Some(range));
        assert_eq!(t.hash(), calc_hash(t.as_slice()));
        assert!(t.equal(&from_slice(&[Value::Number(1.0), Value::symbol("x")])));
    }

    #[test]
    fn equal_tuples_hash_equal() {
        let a = nums(&[1.0, 2.0, 3.0]);
        let b = nums(&[1.0, 2.0, 3.0]);
        assert!(a.equal(&a));
        assert!(a.equal(&b));
        assert_eq!(a.hash(), b.hash());
        assert!(!a.equal(&nums(&[1.0, 2.0])));
    }

    #[test]
    fn hash_collision_is_not_equality() {
        // The low three bits of a number's representation do not
        // reach its hash.
        let x = f64::from_bits(0x4000_0000_0000_0000);
        let y = f64::from_bits(0x4000_0000_0000_0001);
        let a = nums(&[x]);
        let b = nums(&[y]);
        assert_eq!(a.hash(), b.hash());
        assert!(!a.equal(&b));
    }

    #[test]
    fn ordering_is_element_wise_then_by_length() {
        assert_eq!(nums(&[1.0, 2.0]).compare(&nums(&[1.0, 3.0])), Ordering::Less);
        assert_eq!(nums(&[1.0, 2.0]).compare(&nums(&[1.0, 2.0, 0.0])), Ordering::Less);
        assert_eq!(nums(&[2.0]).compare(&nums(&[1.0, 9.0])), Ordering::Greater);
        assert_eq!(nums(&[]).compare(&nums(&[])), Ordering::Equal);
    }

    #[test]
    fn flags_do_not_affect_equality() {
        let round = nums(&[1.0]);
        let mut b = begin(1);
        b.set(0, Value::Number(1.0));
        let square = b.flags(TupleFlags { paren: Parenkind::Square, at: true }).end();
        assert!(round.equal(&square));
        assert_eq!(round.compare(&square), Ordering::Equal);
    }
}
