// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Where the bytes fed to a parser came from, for error messages.
//! Positions are tracked by the parser; a context only names the
//! source.

use crate::pos::Pos;
use kstring::KString;
use std::{path::PathBuf, fmt::{Formatter, Debug, Display}};

pub trait Context : Debug + Send + Sync {
    /// Append the source and position to an error message, starting
    /// with "in" or "from".
    fn describe_at(&self, pos: Pos, f: &mut Formatter<'_>)
                   -> Result<(), std::fmt::Error>;
    /// The source alone, to be followed by a colon and a message.
    fn describe(&self, f: &mut Formatter<'_>)
                -> Result<(), std::fmt::Error>;
    fn label(&self) -> String {
        format!("{}", &Label(self))
    }
}

// Formatter can't be constructed directly.
struct Label<'t, T: Context + ?Sized>(&'t T);
impl<'t, T: Context + ?Sized> Display for Label<'t, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        self.0.describe(f)
    }
}

#[derive(Debug)]
pub struct FileContext {
    pub path: PathBuf
}

impl Context for FileContext {
    fn describe_at(&self, pos: Pos, f: &mut Formatter<'_>)
                   -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("in {:?}{}", &self.path, pos))
    }
    fn describe(&self, f: &mut Formatter<'_>)
                -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("{:?}", &self.path))
    }
}

/// A named source that is not a file, e.g. `stdin`, a socket or a
/// REPL line.
#[derive(Debug)]
pub struct SpecialContext {
    name: KString
}

impl SpecialContext {
    pub fn new(name: &str) -> SpecialContext {
        SpecialContext { name: KString::from_ref(name) }
    }
}

impl Context for SpecialContext {
    fn describe_at(&self, pos: Pos, f: &mut Formatter<'_>)
                   -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("from ({}){}", &self.name, pos))
    }
    fn describe(&self, f: &mut Formatter<'_>)
                -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("({})", &self.name))
    }
}
