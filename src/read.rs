// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reading values from, and writing them to, byte streams.

use crate::context::{self, Context};
use crate::parse::{Parser, ParseErrorWithPos};
use crate::settings::{Settings, DEFAULT_SETTINGS};
use crate::value::Value;
use genawaiter::rc::Gen;
use std::fmt::{Formatter, Display};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::Path;
use std::fs::File;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("{0}")]
    Parse(ParseErrorWithPos),
    #[error("{0}")]
    IO(std::io::Error),
}

#[derive(Error, Debug)]
pub struct ReadErrorWithContext {
    pub err: ReadError,
    pub container: Box<dyn Context>
}

impl Display for ReadErrorWithContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match &self.err {
            ReadError::Parse(e) => {
                f.write_fmt(format_args!("{} ", e.err))?;
                self.container.describe_at(e.pos, f)
            }
            ReadError::IO(e) => {
                self.container.describe(f)?;
                f.write_fmt(format_args!(": {}", e))
            }
        }
    }
}

/// Lazily parse the values in `fh`. Stops after the first error;
/// values completed before it are still yielded.
pub fn values<'s>(
    fh: impl Read + 's,
    settings: Settings,
) -> impl Iterator<Item = Result<Value, ReadError>> + 's
{
    Gen::new(|co| async move {
        let mut input = BufReader::new(fh);
        let mut parser = Parser::with_settings(settings);
        loop {
            let n = match input.fill_buf() {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    co.yield_(Err(ReadError::IO(e))).await;
                    return;
                }
                Ok(bytes) => {
                    parser.feed(bytes);
                    bytes.len()
                }
            };
            if n == 0 {
                parser.end_of_input();
            } else {
                input.consume(n);
            }
            while let Some(v) = parser.produce() {
                co.yield_(Ok(v)).await;
            }
            if let Some(e) = parser.take_error() {
                co.yield_(Err(ReadError::Parse(e))).await;
                return;
            }
            if n == 0 {
                return;
            }
        }
    }).into_iter()
}

pub fn read_all(
    fh: impl Read,
) -> Result<Vec<Value>, ReadError>
{
    values(fh, DEFAULT_SETTINGS).collect()
}

pub fn read_all_in(
    fh: impl Read,
    container: Box<dyn Context>,
) -> Result<Vec<Value>, ReadErrorWithContext>
{
    read_all(fh).map_err(|err| ReadErrorWithContext { err, container })
}

pub fn read_file(path: &Path) -> Result<Vec<Value>, ReadErrorWithContext> {
    let container = Box::new(context::FileContext { path: path.to_path_buf() });
    match File::open(path) {
        Ok(fh) => read_all_in(fh, container),
        Err(e) => Err(ReadErrorWithContext { err: ReadError::IO(e), container })
    }
}

/// Each value on its own line, separated by an empty line.
pub fn write_all<'t>(
    out: impl Write,
    vals: impl IntoIterator<Item = &'t Value>
) -> Result<(), std::io::Error> {
    let mut out = out; // for `File`
    let mut seen_item = false;
    for v in vals.into_iter() {
        writeln!(out, "{}{}", if seen_item {"\n"} else {""}, v)?;
        seen_item = true;
    }
    Ok(())
}

pub fn write_file<'t>(path: &Path, vals: impl IntoIterator<Item = &'t Value>)
                      -> Result<(), std::io::Error> {
    write_all(File::create(path)?, vals)
}
