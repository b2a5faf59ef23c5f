// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Growable byte buffer with an explicit growth policy. Used as the
//! reader's scratch storage and as the payload of `@"..."` buffer
//! literals.

//! The capacity is tracked here rather than taken from `Vec`, so that
//! the doubling policy is the same regardless of what the allocator
//! hands out. All appends go through [`Buffer::extra`].

use thiserror::Error;

/// The largest length (and capacity) a buffer may reach.
pub const MAX_LEN: usize = i32::MAX as usize;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("buffer capacity overflow: {requested} bytes requested, at most {} allowed",
        MAX_LEN)]
pub struct CapacityOverflow {
    pub requested: usize,
}

/// Capacity to allocate when `required` bytes must fit: double the
/// requirement, capped at `MAX_LEN`. Also used for the parser's
/// frame stack and output queue.
pub fn grow_capacity(required: usize) -> usize {
    required.saturating_mul(2).min(MAX_LEN)
}

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    data: Vec<u8>,
    capacity: usize,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer::default()
    }

    pub fn with_capacity(capacity: usize) -> Result<Buffer, CapacityOverflow> {
        if capacity > MAX_LEN {
            return Err(CapacityOverflow { requested: capacity })
        }
        Ok(Buffer {
            data: Vec::with_capacity(capacity),
            capacity
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Buffer, CapacityOverflow> {
        let mut b = Buffer::with_capacity(bytes.len())?;
        b.push_bytes(bytes)?;
        Ok(b)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn regrow(&mut self, capacity: usize) {
        self.data.reserve_exact(capacity - self.data.len());
        self.capacity = capacity;
    }

    /// Make room for at least `capacity` bytes; if growing, allocate
    /// `capacity * growth` (capped at `MAX_LEN`). No-op when the
    /// capacity already suffices.
    pub fn ensure(&mut self, capacity: usize, growth: usize)
                  -> Result<(), CapacityOverflow> {
        if capacity <= self.capacity {
            return Ok(())
        }
        if capacity > MAX_LEN {
            return Err(CapacityOverflow { requested: capacity })
        }
        self.regrow(capacity.saturating_mul(growth).clamp(capacity, MAX_LEN));
        Ok(())
    }

    /// Set the length. Newly exposed bytes are zero; shrinking keeps
    /// the storage.
    pub fn set_count(&mut self, count: usize) -> Result<(), CapacityOverflow> {
        if count > self.data.len() {
            self.ensure(count, 1)?;
            self.data.resize(count, 0);
        } else {
            self.data.truncate(count);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Guarantee that the next `n` appended bytes will not reallocate.
    pub fn extra(&mut self, n: usize) -> Result<(), CapacityOverflow> {
        let new_size = match self.data.len().checked_add(n) {
            Some(s) if s <= MAX_LEN => s,
            _ => return Err(CapacityOverflow {
                requested: self.data.len().saturating_add(n)
            }),
        };
        if new_size > self.capacity {
            self.regrow(grow_capacity(new_size));
        }
        Ok(())
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), CapacityOverflow> {
        self.extra(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn push_str(&mut self, s: &str) -> Result<(), CapacityOverflow> {
        self.push_bytes(s.as_bytes())
    }

    pub fn push_u8(&mut self, byte: u8) -> Result<(), CapacityOverflow> {
        self.extra(1)?;
        self.data.push(byte);
        Ok(())
    }

    pub fn push_u16(&mut self, x: u16) -> Result<(), CapacityOverflow> {
        self.push_bytes(&x.to_le_bytes())
    }

    pub fn push_u32(&mut self, x: u32) -> Result<(), CapacityOverflow> {
        self.push_bytes(&x.to_le_bytes())
    }

    pub fn push_u64(&mut self, x: u64) -> Result<(), CapacityOverflow> {
        self.push_bytes(&x.to_le_bytes())
    }
}
