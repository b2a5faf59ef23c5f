// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Recognizing numeric literals in token text.

//! Accepted forms, each with an optional leading `+` or `-`:
//! decimal (`12`, `1.5`, `.5`, `6.02e23`), hexadecimal (`0x1F`) and
//! radix (`2r1011`, `36rZZ`, radix 2 to 36). `_` may separate digits
//! once the first digit has been seen. Hexadecimal and radix
//! literals are read exactly and then rounded to `f64`.

use num::{BigInt, ToPrimitive};

fn strip_sign(s: &[u8]) -> (bool, &[u8]) {
    match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s)
    }
}

/// The digits of `s` without separators, if every digit is valid in
/// `radix` and there is at least one, not preceded by `_`.
fn radix_digits(s: &[u8], radix: u32) -> Option<Vec<u8>> {
    let mut digits = Vec::with_capacity(s.len());
    for &b in s {
        if b == b'_' {
            if digits.is_empty() {
                return None
            }
        } else {
            (b as char).to_digit(radix)?;
            digits.push(b);
        }
    }
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn scan_integer(s: &[u8], radix: u32) -> Option<f64> {
    let digits = radix_digits(s, radix)?;
    let n = BigInt::parse_bytes(&digits, radix)?;
    Some(n.to_f64().unwrap_or(f64::INFINITY))
}

/// `0x...` or `NrDIGITS`.
fn scan_prefixed(s: &[u8]) -> Option<Option<f64>> {
    if s.len() > 2 && s[0] == b'0' && (s[1] == b'x' || s[1] == b'X') {
        return Some(scan_integer(&s[2..], 16))
    }
    let r = s.iter().position(|&b| b == b'r' || b == b'R')?;
    let prefix = &s[..r];
    if prefix.is_empty() || prefix.len() > 2
        || !prefix.iter().all(u8::is_ascii_digit)
    {
        return None
    }
    let radix = prefix.iter().fold(0, |acc, &b| acc * 10 + (b - b'0') as u32);
    if !(2..=36).contains(&radix) {
        return Some(None)
    }
    Some(scan_integer(&s[r + 1..], radix))
}

fn scan_decimal(s: &[u8]) -> Option<f64> {
    let mut canonical = String::with_capacity(s.len());
    let mut mantissa_digits = 0;
    let mut seen_digit_in_part = false;
    let mut seen_dot = false;
    let mut i = 0;
    while i < s.len() {
        let b = s[i];
        match b {
            b'0'..=b'9' => {
                canonical.push(b as char);
                mantissa_digits += 1;
                seen_digit_in_part = true;
            }
            b'_' if seen_digit_in_part => {}
            b'.' if !seen_dot => {
                canonical.push('.');
                seen_dot = true;
                seen_digit_in_part = false;
            }
            b'e' | b'E' => break,
            _ => return None
        }
        i += 1;
    }
    if mantissa_digits == 0 {
        return None
    }
    if i < s.len() {
        // exponent
        let (neg, digits) = strip_sign(&s[i + 1..]);
        let digits = radix_digits(digits, 10)?;
        canonical.push('e');
        if neg {
            canonical.push('-');
        }
        canonical.extend(digits.iter().map(|&b| b as char));
    }
    canonical.parse::<f64>().ok()
}

/// The value of `s` if the whole token is a numeric literal.
pub fn scan_number(s: &[u8]) -> Option<f64> {
    let (neg, rest) = strip_sign(s);
    if rest.is_empty() {
        return None
    }
    let x = match scan_prefixed(rest) {
        Some(r) => r?,
        None => scan_decimal(rest)?
    };
    Some(if neg { -x } else { x })
}
