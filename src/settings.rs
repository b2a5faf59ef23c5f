// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Settings for the reader.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Maximum number of simultaneously open frames, the root frame
    /// included. Every open container, string, token, comment and
    /// reader macro counts.
    pub max_depth: usize,
    /// Initial capacity of the scratch buffer shared by tokens and
    /// strings.
    pub scratch_capacity: usize,
}

pub const DEFAULT_SETTINGS : Settings = Settings {
    max_depth: 1024,
    scratch_capacity: 64,
};

/// For reading untrusted input with bounded memory for the frame
/// stack.
pub const SHALLOW_SETTINGS : Settings = Settings {
    max_depth: 64,
    scratch_capacity: 64,
};

impl Default for Settings {
    fn default() -> Self {
        DEFAULT_SETTINGS
    }
}
