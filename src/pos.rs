// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Eq;
use std::fmt::{Display, Formatter};

/// Byte offset plus line and column. Both line and col are zero
/// based; Emacs uses 1-based line numbering, so line is incremented
/// by 1 in Display.

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl Pos {
    /// The position of the byte following `c`, if `c` is at `self`.
    pub fn after(self, c: u8) -> Pos {
        if c == b'\n' {
            Pos { offset: self.offset + 1, line: self.line + 1, col: 0 }
        } else {
            Pos { offset: self.offset + 1, line: self.line, col: self.col + 1 }
        }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        // This, when prefixed with a Debug style path string, is
        // following the Emacs convention for location information.
        f.write_fmt(format_args!("@{}.{}", self.line + 1, self.col))
    }
}

/// Half-open range: `start` is the first byte of a form, `end` the
/// position right after its last byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SourceRange {
    pub start: Pos,
    pub end: Pos,
}

impl SourceRange {
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for SourceRange {
    fn fmt(&self, f: &mut Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("{}-{}", self.start, self.end))
    }
}
