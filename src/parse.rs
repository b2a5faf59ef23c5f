// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Translating a byte stream to a stream of values. The [Parser] is
//! fed one byte at a time and never blocks or reads ahead; completed
//! top-level values queue up until taken with
//! [produce](Parser::produce). See [read](../read/index.html) for
//! reading from an `io::Read` instead.

//! Internally the parser is a stack of frames. Each frame kind has a
//! consumer for the next byte; a consumer either consumes the byte or
//! asks for it to be dispatched again to the (new) top frame. Errors
//! are sticky: after the first one, bytes are ignored until
//! [take_error](Parser::take_error) is called.

use crate::buffer::{self, Buffer, CapacityOverflow};
use crate::istring::IString;
use crate::number::scan_number;
use crate::pos::{Pos, SourceRange};
use crate::settings::{Settings, DEFAULT_SETTINGS};
use crate::tuple::{self, TupleFlags};
use crate::value::{Parenkind, Value};
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

fn show_byte(c: &u8) -> String {
    match *c {
        0x21..=0x7e => format!("'{}'", *c as char),
        _ => format!("0x{:02x}", c)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected character {}", show_byte(.0))]
    UnexpectedCharacter(u8),
    #[error("unexpected closing delimiter '{}'", .0.closing())]
    UnexpectedDelimiter(Parenkind),
    #[error("mismatched delimiter: expected '{}' to close '{}' opened {}, got '{}'",
            .0.closing(), .0.opening(), .1, .2.closing())]
    MismatchedDelimiter(Parenkind, Pos, Parenkind),
    #[error("invalid escape sequence: backslash followed by {}", show_byte(.0))]
    InvalidEscape(u8),
    #[error("invalid hex digit {}", show_byte(.0))]
    InvalidHexDigit(u8),
    #[error("symbol literal cannot start with a digit")]
    SymbolStartsWithDigit,
    #[error("empty symbol")]
    EmptySymbol,
    #[error("symbol is not valid UTF-8")]
    InvalidUtf8Symbol,
    #[error("unexpected end of input, form started")]
    UnexpectedEof,
    #[error("nesting too deep")]
    NestingTooDeep,
    #[error("{0}")]
    Capacity(#[from] CapacityOverflow),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{err} {pos}")]
pub struct ParseErrorWithPos {
    pub err: ParseError,
    pub pos: Pos
}

impl ParseError {
    fn at(self, p: Pos) -> ParseErrorWithPos {
        ParseErrorWithPos {
            err: self,
            pos: p
        }
    }
}

trait At<T> {
    fn at(self, p: Pos) -> Result<T, ParseErrorWithPos>;
}

impl<T, E: Into<ParseError>> At<T> for Result<T, E> {
    fn at(self, p: Pos) -> Result<T, ParseErrorWithPos> {
        match self {
            Err(e) => Err(e.into().at(p)),
            Ok(v) => Ok(v)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// At top level, no error.
    Ok,
    /// A sticky error is waiting for [take_error](Parser::take_error).
    Error,
    /// Inside an unfinished form.
    Pending,
    /// [end_of_input](Parser::end_of_input) was called.
    Dead,
}

/// The prefixes `'` `,` `;` and `` ` ``, each wrapping the following
/// form in a 2-element tuple headed by the symbol named here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMacro {
    Quote,
    Unquote,
    Splice,
    Quasiquote,
}

impl ReaderMacro {
    pub fn from_prefix(c: u8) -> Option<ReaderMacro> {
        match c {
            b'\'' => Some(ReaderMacro::Quote),
            b',' => Some(ReaderMacro::Unquote),
            b';' => Some(ReaderMacro::Splice),
            b'`' => Some(ReaderMacro::Quasiquote),
            _ => None
        }
    }

    pub fn symbol_name(self) -> &'static str {
        match self {
            ReaderMacro::Quote => "quote",
            ReaderMacro::Unquote => "unquote",
            ReaderMacro::Splice => "splice",
            ReaderMacro::Quasiquote => "quasiquote",
        }
    }
}

pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0 | 0x0b | 0x0c)
}

/// Bytes that may appear in a symbol, keyword or number token. Every
/// byte from 0x80 up counts, so that UTF-8 encoded symbols pass.
pub fn is_symbol_char(c: u8) -> bool {
    c >= 0x80
        || c.is_ascii_alphanumeric()
        || b"!$%&*+-./:<?=>@^_|".contains(&c)
}

#[derive(Debug, Clone, Copy)]
enum StringState {
    /// Counting the opening run of quotes.
    Opening,
    Body,
    /// Inside a run of quotes that may close a long string.
    EndCandidate { quotes: u32 },
    Escape,
    /// `remaining` hex digits to go; `acc` holds the high nibble of
    /// an unfinished pair.
    HexEscape { remaining: u8, acc: u8 },
}

#[derive(Debug)]
struct StringFrame {
    at: bool,
    /// Length of the opening quote run; 1 for short strings.
    delimiter: u32,
    state: StringState,
}

impl StringFrame {
    fn is_long(&self) -> bool {
        self.delimiter >= 3
    }
}

#[derive(Debug)]
enum FrameKind {
    Root,
    Container { paren: Parenkind, at: bool, items: Vec<Value> },
    ReaderMacro(ReaderMacro),
    /// Just seen `@`, the next byte decides what it prefixes.
    AtPrefix,
    Token { nonascii: bool },
    Str(StringFrame),
    Comment,
}

impl FrameKind {
    fn name(&self) -> &'static str {
        match self {
            FrameKind::Root => "root",
            FrameKind::Container { .. } => "container",
            FrameKind::ReaderMacro(_) => "reader-macro",
            FrameKind::AtPrefix => "at-prefix",
            FrameKind::Token { .. } => "token",
            FrameKind::Str(_) => "string",
            FrameKind::Comment => "comment",
        }
    }
}

#[derive(Debug)]
struct Frame {
    start: Pos,
    kind: FrameKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Consumed,
    /// Dispatch the same byte again, to what is now the top frame.
    Redispatch,
}

#[derive(Debug, Clone, Copy)]
enum Consumer {
    Expression,
    AtSymbol,
    Token,
    Str,
    Comment,
}

enum StringStep {
    Consumed,
    Redispatch,
    Finish { end_after_byte: bool },
}

fn escaped_byte(c: u8) -> Option<u8> {
    match c {
        b'n' => Some(b'\n'),
        b't' => Some(b'\t'),
        b'r' => Some(b'\r'),
        b'0' => Some(0),
        b'f' => Some(0x0c),
        b'v' => Some(0x0b),
        b'a' => Some(0x07),
        b'e' => Some(0x1b),
        b'"' | b'\'' | b'\\' | b'?' => Some(c),
        _ => None
    }
}

fn hex_digit_count(c: u8) -> Option<u8> {
    match c {
        b'x' => Some(2),
        b'u' => Some(4),
        b'U' => Some(8),
        _ => None
    }
}

/// One byte of string content, with the frame and scratch buffer
/// borrowed separately from the parser.
fn string_step(s: &mut StringFrame, buf: &mut Buffer, c: u8)
               -> Result<StringStep, ParseError> {
    match s.state {
        StringState::Opening => {
            if c == b'"' {
                s.delimiter += 1;
                return Ok(StringStep::Consumed)
            }
            if s.delimiter == 2 {
                return Ok(StringStep::Finish { end_after_byte: false })
            }
            s.state = StringState::Body;
            Ok(StringStep::Redispatch)
        }
        StringState::Body => {
            if c == b'"' {
                if s.delimiter == 1 {
                    return Ok(StringStep::Finish { end_after_byte: true })
                }
                s.state = StringState::EndCandidate { quotes: 1 };
            } else if s.is_long() {
                buf.push_u8(c)?;
            } else if c == b'\\' {
                s.state = StringState::Escape;
            } else if c != b'\n' {
                buf.push_u8(c)?;
            }
            Ok(StringStep::Consumed)
        }
        StringState::EndCandidate { quotes } => {
            if c == b'"' {
                let quotes = quotes + 1;
                if quotes == s.delimiter {
                    return Ok(StringStep::Finish { end_after_byte: true })
                }
                s.state = StringState::EndCandidate { quotes };
            } else {
                buf.extra(quotes as usize + 1)?;
                for _ in 0..quotes {
                    buf.push_u8(b'"')?;
                }
                buf.push_u8(c)?;
                s.state = StringState::Body;
            }
            Ok(StringStep::Consumed)
        }
        StringState::Escape => {
            if let Some(b) = escaped_byte(c) {
                buf.push_u8(b)?;
                s.state = StringState::Body;
            } else if let Some(remaining) = hex_digit_count(c) {
                s.state = StringState::HexEscape { remaining, acc: 0 };
            } else {
                return Err(ParseError::InvalidEscape(c))
            }
            Ok(StringStep::Consumed)
        }
        StringState::HexEscape { remaining, acc } => {
            let d = (c as char).to_digit(16)
                .ok_or(ParseError::InvalidHexDigit(c))? as u8;
            let acc = if remaining % 2 == 0 {
                d
            } else {
                buf.push_u8((acc << 4) | d)?;
                0
            };
            s.state = if remaining == 1 {
                StringState::Body
            } else {
                StringState::HexEscape { remaining: remaining - 1, acc }
            };
            Ok(StringStep::Consumed)
        }
    }
}

fn classify_token(bytes: &[u8], nonascii: bool) -> Result<Value, ParseError> {
    let check_utf8 = |b: &[u8]| {
        if nonascii && utf8::decode(b).is_err() {
            Err(ParseError::InvalidUtf8Symbol)
        } else {
            Ok(())
        }
    };
    match bytes {
        [] => Err(ParseError::EmptySymbol),
        [b':', name @ ..] => {
            check_utf8(name)?;
            Ok(Value::Keyword(Rc::new(IString::from_bytes(name))))
        }
        _ => {
            if let Some(x) = scan_number(bytes) {
                return Ok(Value::Number(x))
            }
            match bytes {
                b"nil" => Ok(Value::Nil),
                b"true" => Ok(Value::Bool(true)),
                b"false" => Ok(Value::Bool(false)),
                [b'0'..=b'9', ..] => Err(ParseError::SymbolStartsWithDigit),
                _ => {
                    check_utf8(bytes)?;
                    Ok(Value::Symbol(Rc::new(IString::from_bytes(bytes))))
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Parser {
    settings: Settings,
    states: Vec<Frame>,
    /// Scratch storage for the token or string being read.
    buf: Buffer,
    queue: VecDeque<Value>,
    /// Position of the byte being consumed.
    cursor: Pos,
    error: Option<ParseErrorWithPos>,
    finished: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser::with_settings(DEFAULT_SETTINGS)
    }

    pub fn with_settings(settings: Settings) -> Parser {
        let mut states = Vec::with_capacity(buffer::grow_capacity(1));
        states.push(Frame { start: Pos::default(), kind: FrameKind::Root });
        Parser {
            settings,
            states,
            buf: Buffer::with_capacity(settings.scratch_capacity)
                .unwrap_or_default(),
            queue: VecDeque::new(),
            cursor: Pos::default(),
            error: None,
            finished: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Where the next byte will be read.
    pub fn position(&self) -> Pos {
        self.cursor
    }

    /// Number of completed top-level values not yet taken.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn status(&self) -> Status {
        if self.error.is_some() {
            Status::Error
        } else if self.finished {
            Status::Dead
        } else if self.states.len() > 1 {
            Status::Pending
        } else {
            Status::Ok
        }
    }

    /// The delimiters of the currently open containers and strings,
    /// outermost first, e.g. `(@["` inside `(a @[b "c`.
    pub fn delimiters(&self) -> String {
        let mut out = String::new();
        for frame in &self.states {
            match &frame.kind {
                FrameKind::Container { paren, at, .. } => {
                    if *at {
                        out.push('@');
                    }
                    out.push(paren.opening());
                }
                FrameKind::Str(s) => {
                    if s.at {
                        out.push('@');
                    }
                    for _ in 0..s.delimiter {
                        out.push('"');
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn fail(&mut self, e: ParseErrorWithPos) {
        debug!(error = %e, depth = self.states.len(), "parse error");
        self.error = Some(e);
    }

    fn push_frame(&mut self, start: Pos, kind: FrameKind)
                  -> Result<(), ParseErrorWithPos> {
        let len = self.states.len();
        if len >= self.settings.max_depth {
            return Err(ParseError::NestingTooDeep.at(self.cursor))
        }
        if len == self.states.capacity() {
            self.states.reserve_exact(buffer::grow_capacity(len + 1) - len);
        }
        trace!(depth = len + 1, frame = kind.name(), "push");
        self.states.push(Frame { start, kind });
        Ok(())
    }

    fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.states.pop();
        if let Some(f) = &frame {
            trace!(depth = self.states.len(), frame = f.kind.name(), "pop");
        }
        frame
    }

    fn enqueue(&mut self, value: Value) {
        let len = self.queue.len();
        if len == self.queue.capacity() {
            self.queue.reserve_exact(buffer::grow_capacity(len + 1) - len);
        }
        self.queue.push_back(value);
    }

    /// Hand a finished value to the frame below the one that produced
    /// it (which must already be popped). Reader macros wrap it and
    /// pass it further down.
    fn pop_value(&mut self, value: Value, end: Pos) {
        let mut value = value;
        loop {
            let Some(top) = self.states.last_mut() else { return };
            match &mut top.kind {
                FrameKind::Root => {
                    self.enqueue(value);
                    return
                }
                FrameKind::Container { items, .. } => {
                    items.push(value);
                    return
                }
                FrameKind::ReaderMacro(m) => {
                    let m = *m;
                    let start = top.start;
                    self.pop_frame();
                    let mut t = tuple::begin(2);
                    t.set(0, Value::symbol(m.symbol_name()));
                    t.set(1, value);
                    value = Value::tuple(t.source(SourceRange { start, end }).end());
                }
                FrameKind::AtPrefix
                    | FrameKind::Token { .. }
                    | FrameKind::Str(_)
                    | FrameKind::Comment => return
            }
        }
    }

    fn consumer(&self) -> Option<Consumer> {
        Some(match self.states.last()?.kind {
            FrameKind::Root
                | FrameKind::Container { .. }
                | FrameKind::ReaderMacro(_) => Consumer::Expression,
            FrameKind::AtPrefix => Consumer::AtSymbol,
            FrameKind::Token { .. } => Consumer::Token,
            FrameKind::Str(_) => Consumer::Str,
            FrameKind::Comment => Consumer::Comment,
        })
    }

    fn dispatch(&mut self, c: u8) -> Flow {
        let r = match self.consumer() {
            Some(Consumer::Expression) => self.expression(c),
            Some(Consumer::AtSymbol) => self.at_symbol(c),
            Some(Consumer::Token) => self.token(c),
            Some(Consumer::Str) => self.string_char(c),
            Some(Consumer::Comment) => self.line_comment(c),
            None => Ok(Flow::Consumed),
        };
        match r {
            Ok(flow) => flow,
            Err(e) => {
                self.fail(e);
                Flow::Consumed
            }
        }
    }

    fn expression(&mut self, c: u8) -> Result<Flow, ParseErrorWithPos> {
        let cursor = self.cursor;
        if let Some(m) = ReaderMacro::from_prefix(c) {
            self.push_frame(cursor, FrameKind::ReaderMacro(m))?;
            return Ok(Flow::Consumed)
        }
        match c {
            b'"' => {
                self.push_frame(cursor, FrameKind::Str(StringFrame {
                    at: false,
                    delimiter: 0,
                    state: StringState::Opening,
                }))?;
                Ok(Flow::Redispatch)
            }
            b'#' => {
                self.push_frame(cursor, FrameKind::Comment)?;
                Ok(Flow::Consumed)
            }
            b'@' => {
                self.push_frame(cursor, FrameKind::AtPrefix)?;
                Ok(Flow::Consumed)
            }
            b'(' | b'[' | b'{' => {
                self.open_container(cursor, c, false)?;
                Ok(Flow::Consumed)
            }
            b')' | b']' | b'}' => self.close_container(c),
            _ if is_whitespace(c) => Ok(Flow::Consumed),
            _ if is_symbol_char(c) => {
                self.push_frame(cursor, FrameKind::Token { nonascii: false })?;
                Ok(Flow::Redispatch)
            }
            _ => Err(ParseError::UnexpectedCharacter(c).at(cursor))
        }
    }

    fn open_container(&mut self, start: Pos, c: u8, at: bool)
                      -> Result<(), ParseErrorWithPos> {
        let paren = match c {
            b'[' => Parenkind::Square,
            b'{' => Parenkind::Curly,
            _ => Parenkind::Round,
        };
        self.push_frame(start, FrameKind::Container { paren, at, items: Vec::new() })
    }

    fn close_container(&mut self, c: u8) -> Result<Flow, ParseErrorWithPos> {
        let cursor = self.cursor;
        let Some(kind) = Parenkind::from_closing(c) else {
            return Err(ParseError::UnexpectedCharacter(c).at(cursor))
        };
        match self.states.last() {
            Some(Frame { kind: FrameKind::Container { paren, .. }, start }) => {
                if *paren != kind {
                    return Err(ParseError::MismatchedDelimiter(*paren, *start, kind)
                               .at(cursor))
                }
            }
            _ => return Err(ParseError::UnexpectedDelimiter(kind).at(cursor))
        }
        if let Some(Frame {
            start,
            kind: FrameKind::Container { paren, at, items }
        }) = self.pop_frame() {
            let end = cursor.after(c);
            let mut t = tuple::begin(items.len());
            for (i, item) in items.into_iter().enumerate() {
                t.set(i, item);
            }
            let t = t.flags(TupleFlags { paren, at })
                .source(SourceRange { start, end })
                .end();
            self.pop_value(Value::tuple(t), end);
        }
        Ok(Flow::Consumed)
    }

    fn at_symbol(&mut self, c: u8) -> Result<Flow, ParseErrorWithPos> {
        let start = match self.pop_frame() {
            Some(frame) => frame.start,
            None => self.cursor
        };
        match c {
            b'(' | b'[' | b'{' => {
                self.open_container(start, c, true)?;
                Ok(Flow::Consumed)
            }
            b'"' => {
                self.push_frame(start, FrameKind::Str(StringFrame {
                    at: true,
                    delimiter: 0,
                    state: StringState::Opening,
                }))?;
                Ok(Flow::Redispatch)
            }
            _ => {
                self.push_frame(start, FrameKind::Token { nonascii: false })?;
                self.buf.push_u8(b'@').at(start)?;
                Ok(Flow::Redispatch)
            }
        }
    }

    fn token(&mut self, c: u8) -> Result<Flow, ParseErrorWithPos> {
        let cursor = self.cursor;
        let Some(Frame { kind: FrameKind::Token { nonascii }, start }) =
            self.states.last_mut() else {
                return Ok(Flow::Consumed)
            };
        let start = *start;
        if is_symbol_char(c) {
            if c >= 0x80 {
                *nonascii = true;
            }
            self.buf.push_u8(c).at(cursor)?;
            return Ok(Flow::Consumed)
        }
        let value = classify_token(self.buf.as_bytes(), *nonascii).at(start)?;
        self.buf.clear();
        self.pop_frame();
        self.pop_value(value, cursor);
        Ok(Flow::Redispatch)
    }

    fn string_char(&mut self, c: u8) -> Result<Flow, ParseErrorWithPos> {
        let cursor = self.cursor;
        let Some(Frame { kind: FrameKind::Str(s), .. }) = self.states.last_mut() else {
            return Ok(Flow::Consumed)
        };
        match string_step(s, &mut self.buf, c).at(cursor)? {
            StringStep::Consumed => Ok(Flow::Consumed),
            StringStep::Redispatch => Ok(Flow::Redispatch),
            StringStep::Finish { end_after_byte } => {
                if end_after_byte {
                    self.finish_string(cursor.after(c))?;
                    Ok(Flow::Consumed)
                } else {
                    self.finish_string(cursor)?;
                    Ok(Flow::Redispatch)
                }
            }
        }
    }

    fn finish_string(&mut self, end: Pos) -> Result<(), ParseErrorWithPos> {
        let Some(Frame { kind: FrameKind::Str(s), start }) = self.pop_frame() else {
            return Ok(())
        };
        let mut bytes = self.buf.as_bytes();
        if s.is_long() {
            if let [b'\n', rest @ ..] = bytes {
                bytes = rest;
            }
            if let [rest @ .., b'\n'] = bytes {
                bytes = rest;
            }
        }
        let value = if s.at {
            Value::buffer(Buffer::from_bytes(bytes).at(start)?)
        } else {
            Value::string(bytes)
        };
        self.buf.clear();
        self.pop_value(value, end);
        Ok(())
    }

    fn line_comment(&mut self, c: u8) -> Result<Flow, ParseErrorWithPos> {
        if c == b'\n' {
            self.pop_frame();
        }
        Ok(Flow::Consumed)
    }

    /// Feed one byte. Does nothing while an error is pending or after
    /// [end_of_input](Parser::end_of_input).
    pub fn consume(&mut self, c: u8) {
        if self.error.is_some() || self.finished {
            return
        }
        while self.dispatch(c) == Flow::Redispatch && self.error.is_none() {}
        self.cursor = self.cursor.after(c);
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &c in bytes {
            self.consume(c);
        }
    }

    /// Finish a trailing token or comment and check that no form is
    /// left open. The parser is dead afterwards until
    /// [take_error](Parser::take_error) is called.
    pub fn end_of_input(&mut self) {
        if self.error.is_none() && !self.finished {
            let cursor = self.cursor;
            self.consume(b'\n');
            self.cursor = cursor;
            if self.error.is_none() && self.states.len() > 1 {
                let start = self.states.last().map(|f| f.start).unwrap_or(cursor);
                self.fail(ParseError::UnexpectedEof.at(start));
            }
        }
        self.finished = true;
    }

    /// The oldest completed top-level value, if any.
    pub fn produce(&mut self) -> Option<Value> {
        self.queue.pop_front()
    }

    /// Take the sticky error, if any, and if so discard the form in
    /// progress so that parsing can continue.
    pub fn take_error(&mut self) -> Option<ParseErrorWithPos> {
        let e = self.error.take();
        if e.is_some() {
            self.finished = false;
            self.flush();
        }
        e
    }

    /// Drop all open frames and the scratch buffer. Completed values
    /// stay queued.
    pub fn flush(&mut self) {
        if self.states.len() > 1 || !self.buf.is_empty() {
            debug!(depth = self.states.len(), "flushing unfinished form");
        }
        self.states.truncate(1);
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &[u8]) -> (Vec<Value>, Option<ParseErrorWithPos>) {
        let mut p = Parser::new();
        p.feed(s);
        p.end_of_input();
        let err = p.take_error();
        let mut vals = Vec::new();
        while let Some(v) = p.produce() {
            vals.push(v);
        }
        (vals, err)
    }

    fn parse_ok(s: &[u8]) -> Vec<Value> {
        let (vals, err) = parse(s);
        assert_eq!(err, None);
        vals
    }

    fn parse_err(s: &[u8]) -> ParseErrorWithPos {
        let (_, err) = parse(s);
        match err {
            Some(e) => e,
            None => panic!("expected an error for {:?}", String::from_utf8_lossy(s))
        }
    }

    fn tuple_of(v: &Value) -> &tuple::Tuple {
        v.as_tuple().expect("a tuple")
    }

    fn list(items: &[Value]) -> Value {
        Value::tuple(tuple::from_slice(items))
    }

    #[test]
    fn atoms() {
        assert_eq!(parse_ok(b"nil true false 12 -1.5 :kw sym -"), vec![
            Value::Nil, Value::Bool(true), Value::Bool(false),
            Value::Number(12.0), Value::Number(-1.5),
            Value::keyword("kw"), Value::symbol("sym"), Value::symbol("-"),
        ]);
        assert_eq!(parse_ok(b"0x1f 2r11 1e2"), vec![
            Value::Number(31.0), Value::Number(3.0), Value::Number(100.0),
        ]);
    }

    #[test]
    fn atoms_fed_bytewise() {
        for (src, expected) in [
            (&b"abc"[..], Value::symbol("abc")),
            (&b":a.b"[..], Value::keyword("a.b")),
            (&b"3.25"[..], Value::Number(3.25)),
            (&b"nil"[..], Value::Nil),
        ] {
            let mut p = Parser::new();
            for &c in src {
                p.consume(c);
            }
            assert_eq!(p.pending(), 0);
            p.end_of_input();
            assert_eq!(p.produce(), Some(expected));
            assert_eq!(p.produce(), None);
        }
    }

    #[test]
    fn tuples_keep_order_and_delimiters() {
        let vals = parse_ok(b"(1 [2 3] {})");
        assert_eq!(vals.len(), 1);
        let t = tuple_of(&vals[0]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.flags(), TupleFlags { paren: Parenkind::Round, at: false });
        assert_eq!(t.get(0), Some(&Value::Number(1.0)));
        let inner = tuple_of(&t.as_slice()[1]);
        assert_eq!(inner.flags().paren, Parenkind::Square);
        assert_eq!(inner.as_slice(), &[Value::Number(2.0), Value::Number(3.0)]);
        let empty = tuple_of(&t.as_slice()[2]);
        assert!(empty.is_empty());
        assert_eq!(empty.flags().paren, Parenkind::Curly);
    }

    #[test]
    fn short_string_escapes() {
        assert_eq!(parse_ok(b"\"a\\tb\\x41\\u0041z\\\"\\\\\""),
                   vec![Value::string(b"a\tb\x41\x00\x41z\"\\")]);
        assert_eq!(parse_ok(b"\"\\e\\a\\?\\'\\0\\f\\v\\r\\n\""),
                   vec![Value::string(b"\x1b\x07?'\0\x0c\x0b\r\n")]);
        assert_eq!(parse_ok(b"\"\\U41424344\""),
                   vec![Value::string(b"ABCD")]);
    }

    #[test]
    fn short_strings_drop_newlines() {
        assert_eq!(parse_ok(b"\"ab\ncd\""), vec![Value::string(b"abcd")]);
    }

    #[test]
    fn long_strings() {
        assert_eq!(parse_ok(b"\"\"\"\nline1\n\\n \"line2\"\n\"\"\""),
                   vec![Value::string(b"line1\n\\n \"line2\"")]);
        assert_eq!(parse_ok(b"\"\"\"\"a\"b\"\"\"c\"\"\"\""),
                   vec![Value::string(b"a\"b\"\"\"c")]);
        assert_eq!(parse_ok(b"\"\"\"x\"\"\"y"),
                   vec![Value::string(b"x"), Value::symbol("y")]);
    }

    #[test]
    fn empty_strings() {
        assert_eq!(parse_ok(b"\"\" x"), vec![Value::string(b""), Value::symbol("x")]);
        assert_eq!(parse_ok(b"(\"\")"), vec![list(&[Value::string(b"")])]);
        assert_eq!(parse_ok(b"\"\""), vec![Value::string(b"")]);
    }

    #[test]
    fn adjacent_tokens_and_strings() {
        assert_eq!(parse_ok(b"abc\"x\"(y)"), vec![
            Value::symbol("abc"), Value::string(b"x"), list(&[Value::symbol("y")]),
        ]);
    }

    #[test]
    fn reader_macros() {
        let quote = |v| list(&[Value::symbol("quote"), v]);
        assert_eq!(parse_ok(b"'x"), vec![quote(Value::symbol("x"))]);
        assert_eq!(parse_ok(b"''x"), vec![quote(quote(Value::symbol("x")))]);
        assert_eq!(parse_ok(b"(,a ;b `c)"), vec![list(&[
            list(&[Value::symbol("unquote"), Value::symbol("a")]),
            list(&[Value::symbol("splice"), Value::symbol("b")]),
            list(&[Value::symbol("quasiquote"), Value::symbol("c")]),
        ])]);
        assert_eq!(parse_ok(b"'\"s\""), vec![quote(Value::string(b"s"))]);
    }

    #[test]
    fn unterminated_form() {
        let mut p = Parser::new();
        p.feed(b"(a b");
        assert_eq!(p.status(), Status::Pending);
        p.end_of_input();
        assert_eq!(p.status(), Status::Error);
        let e = p.take_error().expect("an error");
        assert_eq!(e.err, ParseError::UnexpectedEof);
        assert_eq!(e.pos.offset, 0);
        assert_eq!(e.to_string(), "unexpected end of input, form started @1.0");
        assert_eq!(p.produce(), None);
    }

    #[test]
    fn unterminated_string_reports_its_start() {
        let e = parse_err(b"x \"abc");
        assert_eq!(e.err, ParseError::UnexpectedEof);
        assert_eq!(e.pos.offset, 2);
    }

    #[test]
    fn recovery_after_error() {
        let mut p = Parser::new();
        p.feed(b"1 (a ~ b");
        assert_eq!(p.status(), Status::Error);
        p.feed(b") 99");
        let e = p.take_error().expect("an error");
        assert_eq!(e.err, ParseError::UnexpectedCharacter(b'~'));
        assert_eq!(e.pos.offset, 5);
        assert_eq!(p.status(), Status::Ok);
        p.feed(b" 2");
        p.end_of_input();
        assert_eq!(p.take_error(), None);
        assert_eq!(p.produce(), Some(Value::Number(1.0)));
        assert_eq!(p.produce(), Some(Value::Number(2.0)));
        assert_eq!(p.produce(), None);
    }

    #[test]
    fn bad_escapes() {
        let e = parse_err(b"\"\\q\"");
        assert_eq!(e.err, ParseError::InvalidEscape(b'q'));
        assert_eq!(e.pos.offset, 2);
        assert_eq!(parse_err(b"\"\\xZZ\"").err, ParseError::InvalidHexDigit(b'Z'));
        assert_eq!(parse_err(b"\"\\u12g4\"").err, ParseError::InvalidHexDigit(b'g'));
    }

    #[test]
    fn symbols_cannot_start_with_digits() {
        let e = parse_err(b"  1abc ");
        assert_eq!(e.err, ParseError::SymbolStartsWithDigit);
        assert_eq!(e.pos.offset, 2);
        assert_eq!(parse_ok(b"-1abc"), vec![Value::symbol("-1abc")]);
    }

    #[test]
    fn utf8_symbols() {
        assert_eq!(parse_ok("héllo".as_bytes()), vec![Value::symbol("héllo")]);
        assert_eq!(parse_err(b"a\xffb").err, ParseError::InvalidUtf8Symbol);
        assert_eq!(parse_err(b":\xc3").err, ParseError::InvalidUtf8Symbol);
    }

    #[test]
    fn at_forms() {
        let vals = parse_ok(b"@foo @[1] @\"x\" @ ");
        assert_eq!(vals[0], Value::symbol("@foo"));
        let t = tuple_of(&vals[1]);
        assert_eq!(t.flags(), TupleFlags { paren: Parenkind::Square, at: true });
        assert_eq!(t.source().map(|r| (r.start.offset, r.end.offset)), Some((5, 9)));
        match &vals[2] {
            Value::Buffer(b) => assert_eq!(b.borrow().as_bytes(), b"x"),
            v => panic!("expected a buffer, got {}", v),
        }
        assert_eq!(vals[3], Value::symbol("@"));
        assert_eq!(vals.len(), 4);
    }

    #[test]
    fn at_long_string() {
        let vals = parse_ok(b"@\"\"\"a\"b\"\"\"");
        match &vals[0] {
            Value::Buffer(b) => assert_eq!(b.borrow().as_bytes(), b"a\"b"),
            v => panic!("expected a buffer, got {}", v),
        }
    }

    #[test]
    fn source_ranges() {
        let vals = parse_ok(b"(a (b))");
        let outer = tuple_of(&vals[0]);
        let r = outer.source().expect("a range");
        assert_eq!((r.start.offset, r.end.offset), (0, 7));
        let inner = tuple_of(&outer.as_slice()[1]);
        let r = inner.source().expect("a range");
        assert_eq!((r.start.offset, r.end.offset), (3, 6));

        let vals = parse_ok(b"'(a)");
        let r = tuple_of(&vals[0]).source().expect("a range");
        assert_eq!((r.start.offset, r.end.offset), (0, 4));

        let vals = parse_ok(b"'x ");
        let r = tuple_of(&vals[0]).source().expect("a range");
        assert_eq!((r.start.offset, r.end.offset), (0, 2));

        let vals = parse_ok(b"x\n  (y\nz)");
        let r = tuple_of(&vals[1]).source().expect("a range");
        assert_eq!(r.start, Pos { offset: 4, line: 1, col: 2 });
        assert_eq!(r.end, Pos { offset: 9, line: 2, col: 2 });
        assert_eq!(r.to_string(), "@2.2-@3.2");
    }

    #[test]
    fn status_transitions() {
        let mut p = Parser::new();
        assert_eq!(p.status(), Status::Ok);
        p.consume(b'(');
        assert_eq!(p.status(), Status::Pending);
        p.consume(b')');
        assert_eq!(p.status(), Status::Ok);
        assert_eq!(p.pending(), 1);
        p.end_of_input();
        assert_eq!(p.status(), Status::Dead);
        let pos = p.position();
        p.consume(b'1');
        assert_eq!(p.position(), pos);
        assert_eq!(p.pending(), 1);
        assert_eq!(p.take_error(), None);
        assert_eq!(p.status(), Status::Dead);
    }

    #[test]
    fn comments() {
        assert_eq!(parse_ok(b"# comment (\n42 # trailing"),
                   vec![Value::Number(42.0)]);
        assert_eq!(parse_ok(b"(1 # x)\n 2)"),
                   vec![list(&[Value::Number(1.0), Value::Number(2.0)])]);
        assert_eq!(parse_ok(b"abc# c"), vec![Value::symbol("abc")]);
    }

    #[test]
    fn delimiter_errors() {
        let e = parse_err(b" )");
        assert_eq!(e.err, ParseError::UnexpectedDelimiter(Parenkind::Round));
        assert_eq!(e.pos.offset, 1);
        let e = parse_err(b"(]");
        assert_eq!(e.err, ParseError::MismatchedDelimiter(
            Parenkind::Round, Pos::default(), Parenkind::Square));
        assert_eq!(e.to_string(),
                   "mismatched delimiter: expected ')' to close '(' opened @1.0, \
                    got ']' @1.1");
        assert_eq!(parse_err(b"(a ')").err,
                   ParseError::UnexpectedDelimiter(Parenkind::Round));
        assert_eq!(parse_err(b"~").err, ParseError::UnexpectedCharacter(b'~'));
        assert_eq!(parse_err(b"~").to_string(), "unexpected character '~' @1.0");
    }

    #[test]
    fn fifo() {
        let mut p = Parser::new();
        p.feed(b"a b (c) d");
        assert_eq!(p.pending(), 3);
        assert_eq!(p.produce(), Some(Value::symbol("a")));
        p.end_of_input();
        assert_eq!(p.pending(), 3);
        assert_eq!(p.produce(), Some(Value::symbol("b")));
        assert_eq!(p.produce(), Some(list(&[Value::symbol("c")])));
        assert_eq!(p.produce(), Some(Value::symbol("d")));
        assert_eq!(p.produce(), None);
    }

    #[test]
    fn open_delimiters() {
        let mut p = Parser::new();
        p.feed(b"(a @[b \"\"\"c");
        assert_eq!(p.delimiters(), "(@[\"\"\"");
        p.feed(b"\"\"\"])");
        assert_eq!(p.delimiters(), "");
    }

    #[test]
    fn nesting_limit() {
        let settings = Settings { max_depth: 4, ..DEFAULT_SETTINGS };
        let mut p = Parser::with_settings(settings);
        p.feed(b"((()))");
        assert_eq!(p.take_error(), None);
        p.feed(b"((((");
        let e = p.take_error().expect("an error");
        assert_eq!(e.err, ParseError::NestingTooDeep);
        assert_eq!(e.pos.offset, 9);
        assert_eq!(p.produce().map(|v| v.to_string()), Some("((()))".into()));
    }

    #[test]
    fn flush_discards_only_the_open_form() {
        let mut p = Parser::new();
        p.feed(b"done (half \"str");
        p.flush();
        assert_eq!(p.status(), Status::Ok);
        assert_eq!(p.delimiters(), "");
        p.feed(b" x ");
        assert_eq!(p.produce(), Some(Value::symbol("done")));
        assert_eq!(p.produce(), Some(Value::symbol("x")));
    }
}
