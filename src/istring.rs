// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable byte strings with a cached hash. Strings, symbols and
//! keywords all use this representation; only the [Value](crate::value::Value)
//! variant tells them apart.

use std::cmp::Ordering;

/// djb2 over the bytes, wrapping at 32 bits.
pub fn calc_hash(bytes: &[u8]) -> i32 {
    let mut hash: u32 = 5381;
    for &b in bytes {
        hash = (hash << 5).wrapping_add(hash).wrapping_add(b as u32);
    }
    hash as i32
}

#[derive(Debug)]
pub struct IString {
    hash: i32,
    bytes: Box<[u8]>,
}

/// A string under construction, see [begin].
#[derive(Debug)]
pub struct StringBuilder {
    bytes: Vec<u8>,
}

/// Reserve a string of `length` zero bytes to be filled in through
/// [StringBuilder::as_mut_bytes] and finished with
/// [StringBuilder::end].
pub fn begin(length: usize) -> StringBuilder {
    StringBuilder { bytes: vec![0; length] }
}

impl StringBuilder {
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn end(self) -> IString {
        IString {
            hash: calc_hash(&self.bytes),
            bytes: self.bytes.into_boxed_slice(),
        }
    }
}

impl IString {
    pub fn from_bytes(bytes: &[u8]) -> IString {
        IString {
            hash: calc_hash(bytes),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn hash(&self) -> i32 {
        self.hash
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The contents, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        utf8::decode(&self.bytes).ok()
    }

    /// Byte-wise; a proper prefix sorts first.
    pub fn compare(&self, other: &IString) -> Ordering {
        let n = self.len().min(other.len());
        match self.bytes[..n].cmp(&other.bytes[..n]) {
            Ordering::Equal => self.len().cmp(&other.len()),
            o => o,
        }
    }

    pub fn equal(&self, other: &IString) -> bool {
        if std::ptr::eq(self, other) {
            return true
        }
        self.hash == other.hash
            && self.len() == other.len()
            && self.bytes == other.bytes
    }
}

impl From<&str> for IString {
    fn from(s: &str) -> IString {
        IString::from_bytes(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_slice_agree() {
        let mut b = begin(3);
        b.as_mut_bytes().copy_from_slice(b"abc");
        let s = b.end();
        let t = IString::from_bytes(b"abc");
        assert_eq!(s.hash(), t.hash());
        assert!(s.equal(&t));
        assert_eq!(s.as_str(), Some("abc"));
    }

    #[test]
    fn hash_is_djb2() {
        assert_eq!(calc_hash(b""), 5381);
        assert_eq!(calc_hash(b"a"), 5381 * 33 + 97);
    }

    #[test]
    fn begin_starts_zeroed() {
        let s = begin(2).end();
        assert_eq!(s.as_bytes(), b"\0\0");
    }

    #[test]
    fn ordering() {
        let ab = IString::from("ab");
        let abc = IString::from("abc");
        let b = IString::from("b");
        assert_eq!(ab.compare(&abc), Ordering::Less);
        assert_eq!(abc.compare(&ab), Ordering::Greater);
        assert_eq!(abc.compare(&b), Ordering::Less);
        assert_eq!(ab.compare(&IString::from("ab")), Ordering::Equal);
        assert!(!ab.equal(&abc));
    }

    #[test]
    fn invalid_utf8_has_no_str() {
        let s = IString::from_bytes(&[0xff, 0x41]);
        assert_eq!(s.as_str(), None);
        assert_eq!(s.len(), 2);
    }
}
