// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Structural hashing, equality and total ordering over [Value]s.

//! Values of different kinds order by
//! [ValueKind](crate::value::ValueKind). Strings, symbols, keywords
//! and tuples compare by content; buffers are mutable and compare by
//! identity.

use crate::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

/// Fold a 64-bit pattern into 32 bits: the low word shifted right
/// (arithmetically) by three, xored with the high word.
pub fn hash_bits(bits: u64) -> i32 {
    let low = (bits & 0xFFFF_FFFF) as u32 as i32;
    (low >> 3) ^ ((bits >> 32) as u32 as i32)
}

fn canonical_number(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else if x.is_nan() {
        f64::NAN
    } else {
        x
    }
}

fn hash_ptr<T>(p: *const T) -> i32 {
    hash_bits(p as *const u8 as usize as u64)
}

pub fn hash(v: &Value) -> i32 {
    match v {
        Value::Nil => 0,
        Value::Bool(b) => *b as i32,
        Value::Number(x) => hash_bits(canonical_number(*x).to_bits()),
        Value::String(s) | Value::Symbol(s) | Value::Keyword(s) => s.hash(),
        Value::Tuple(t) => t.hash(),
        Value::Buffer(b) => hash_ptr(Rc::as_ptr(b)),
    }
}

pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) =>
            x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y))
            | (Value::Symbol(x), Value::Symbol(y))
            | (Value::Keyword(x), Value::Keyword(y)) => x.equal(y),
        (Value::Tuple(x), Value::Tuple(y)) => x.equal(y),
        (Value::Buffer(x), Value::Buffer(y)) => Rc::ptr_eq(x, y),
        _ => false
    }
}

fn compare_numbers(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Total order consistent with [equal]. NaN sorts above every other
/// number; -0 and 0 are equal.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(*x, *y),
        (Value::String(x), Value::String(y))
            | (Value::Symbol(x), Value::Symbol(y))
            | (Value::Keyword(x), Value::Keyword(y)) => x.compare(y),
        (Value::Tuple(x), Value::Tuple(y)) => x.compare(y),
        (Value::Buffer(x), Value::Buffer(y)) =>
            (Rc::as_ptr(x) as usize).cmp(&(Rc::as_ptr(y) as usize)),
        _ => a.kind().cmp(&b.kind())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        equal(self, other)
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_i32(hash(self))
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Value) -> Ordering {
        compare(self, other)
    }
}
