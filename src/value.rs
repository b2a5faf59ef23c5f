// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime data types representing a language value.

//! [Value](Value) is a tagged enum; heap kinds are `Rc` handles, so
//! cloning a value is cheap and never copies string or tuple
//! payloads. [ValueKind](ValueKind) enumerates every kind the runtime
//! knows about, including the ones this crate never constructs, in
//! the order used by [compare](crate::algebra::compare).

use crate::{buffer::Buffer, istring::IString, tuple::Tuple};
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Number,
    Nil,
    Bool,
    Fiber,
    String,
    Symbol,
    Keyword,
    Array,
    Tuple,
    Table,
    Struct,
    Buffer,
    Function,
    CFunction,
    Abstract,
    Pointer,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Nil => "nil",
            ValueKind::Bool => "boolean",
            ValueKind::Fiber => "fiber",
            ValueKind::String => "string",
            ValueKind::Symbol => "symbol",
            ValueKind::Keyword => "keyword",
            ValueKind::Array => "array",
            ValueKind::Tuple => "tuple",
            ValueKind::Table => "table",
            ValueKind::Struct => "struct",
            ValueKind::Buffer => "buffer",
            ValueKind::Function => "function",
            ValueKind::CFunction => "cfunction",
            ValueKind::Abstract => "abstract",
            ValueKind::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parenkind {
    #[default]
    Round,
    Square,
    Curly
}

impl Parenkind {
    pub fn opening(self) -> char {
        match self {
            Parenkind::Round => '(',
            Parenkind::Square => '[',
            Parenkind::Curly => '{'
        }
    }
    pub fn closing(self) -> char {
        match self {
            Parenkind::Round => ')',
            Parenkind::Square => ']',
            Parenkind::Curly => '}'
        }
    }
    pub fn from_closing(c: u8) -> Option<Parenkind> {
        match c {
            b')' => Some(Parenkind::Round),
            b']' => Some(Parenkind::Square),
            b'}' => Some(Parenkind::Curly),
            _ => None
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<IString>),
    Symbol(Rc<IString>),
    Keyword(Rc<IString>),
    Tuple(Rc<Tuple>),
    /// Mutable; compared and hashed by identity.
    Buffer(Rc<RefCell<Buffer>>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Keyword(_) => ValueKind::Keyword,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Buffer(_) => ValueKind::Buffer,
        }
    }

    /// Everything except `nil` and `false` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn string(bytes: &[u8]) -> Value {
        Value::String(Rc::new(IString::from_bytes(bytes)))
    }

    pub fn symbol(s: &str) -> Value {
        Value::Symbol(Rc::new(IString::from(s)))
    }

    pub fn keyword(s: &str) -> Value {
        Value::Keyword(Rc::new(IString::from(s)))
    }

    pub fn tuple(t: Tuple) -> Value {
        Value::Tuple(Rc::new(t))
    }

    pub fn buffer(b: Buffer) -> Value {
        Value::Buffer(Rc::new(RefCell::new(b)))
    }

    /// The bytes of a string, symbol or keyword.
    pub fn as_istring(&self) -> Option<&IString> {
        match self {
            Value::String(s) | Value::Symbol(s) | Value::Keyword(s) => Some(s),
            _ => None
        }
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None
        }
    }
}

fn fmt_quoted(f: &mut std::fmt::Formatter<'_>, bytes: &[u8])
              -> Result<(), std::fmt::Error> {
    f.write_char('"')?;
    for &b in bytes {
        match b {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            b'\n' => f.write_str("\\n")?,
            b'\t' => f.write_str("\\t")?,
            b'\r' => f.write_str("\\r")?,
            0 => f.write_str("\\0")?,
            0x20..=0x7e => f.write_char(b as char)?,
            _ => f.write_fmt(format_args!("\\x{:02x}", b))?,
        }
    }
    f.write_char('"')
}

/// Writes source syntax that reads back as an equal value (except
/// for buffers, which are compared by identity, and NaN/infinite
/// numbers, which have no literal syntax).
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Number(n) => f.write_fmt(format_args!("{}", n)),
            Value::String(s) => fmt_quoted(f, s.as_bytes()),
            Value::Symbol(s) => f.write_str(&String::from_utf8_lossy(s.as_bytes())),
            Value::Keyword(s) => {
                f.write_char(':')?;
                f.write_str(&String::from_utf8_lossy(s.as_bytes()))
            }
            Value::Tuple(t) => {
                let flags = t.flags();
                if flags.at {
                    f.write_char('@')?;
                }
                f.write_char(flags.paren.opening())?;
                for (i, item) in t.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    f.write_fmt(format_args!("{}", item))?;
                }
                f.write_char(flags.paren.closing())
            }
            Value::Buffer(b) => {
                f.write_char('@')?;
                fmt_quoted(f, b.borrow().as_bytes())
            }
        }
    }
}
