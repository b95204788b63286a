// Copyright 2015-2020 Aerospike, Inc.
//
// Portions may be licensed to Aerospike, Inc. under one or more contributor
// license agreements.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

//! Server-side predicate (filter) expressions.
//!
//! A `FilterExpression` is opaque to this crate: callers build the packed
//! expression bytes with whatever expression-tree builder they link against
//! and hand the result to a policy's `filter_expression` field. The codec's
//! only job is to frame those bytes as the request's predicate-expression
//! field and to copy them unchanged on every retry of the same batch.

use crate::commands::buffer::Buffer;

/// A pre-encoded server-side filter expression, evaluated before a batch key
/// is read. If the expression evaluates to false for a key, that key's
/// result is reported as `ResultCode::FilteredOut` rather than a bin set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression(Vec<u8>);

impl FilterExpression {
    /// Wrap already-packed expression bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        FilterExpression(bytes)
    }

    /// Size in bytes of the packed expression, as carried on the wire.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn write(&self, buf: &mut Buffer) {
        buf.write_bytes(&self.0);
    }
}
