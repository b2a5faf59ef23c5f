// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The reader of the Fenn language: turns bytes into values.
//!
//! * `fenn_reader::parse` is an incremental, push-driven parser. It
//!   takes one byte at a time, so it can be driven from a file, a
//!   terminal or a socket without buffering whole programs, and
//!   queues completed top-level forms for the caller to drain.
//!
//! * Values are numbers, `nil`, booleans, strings, symbols, keywords,
//!   tuples (written with `()`, `[]` or `{}`, each remembering the
//!   source range it was read from) and mutable buffers (`@"..."`).
//!   `fenn_reader::algebra` gives them structural hashing, equality
//!   and a total order.
//!
//! * `fenn_reader::read` wraps the parser for `io::Read` sources,
//!   lazily or all at once, and writes values back as source text.
//!
//! Errors carry precise positions (`@line.column`, Emacs style) and
//! are recoverable: after an error is taken, parsing resumes at the
//! next top-level form.

pub mod algebra;
pub mod buffer;
pub mod context;
pub mod istring;
pub mod number;
pub mod parse;
pub mod pos;
pub mod read;
pub mod settings;
pub mod tuple;
pub mod value;
