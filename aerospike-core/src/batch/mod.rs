// Copyright 2015-2018 Aerospike, Inc.
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

mod batch_executor;
mod batch_read;

pub use self::batch_executor::BatchExecutor;
pub use self::batch_read::BatchRead;

use crate::expressions::FilterExpression;
use crate::ReadTouchTTL;

/// Policy for a single batch read entry within a larger batch request.
///
/// Currently unused by the batch read path itself, which takes its per-record settings
/// (`read_touch_ttl`, `filter_expression`) from the enclosing `BatchPolicy` instead; kept for
/// callers that build per-key overrides ahead of a future per-entry policy override.
#[derive(Debug, Clone)]
pub struct BatchReadPolicy {
    /// How record TTL is affected by this read. See `BatchPolicy::base_policy.read_touch_ttl`
    /// for the full explanation of the percentage semantics.
    ///
    /// Default: `ReadTouchTTL::ServerDefault`
    pub read_touch_ttl: ReadTouchTTL,

    /// Optional per-entry server-side predicate expression. If it evaluates to false for this
    /// key, `BatchRead::result_code` is set to `ResultCode::FilteredOut` rather than a bin set.
    ///
    /// Default: `None`
    pub filter_expression: Option<FilterExpression>,
}

impl Default for BatchReadPolicy {
    fn default() -> Self {
        Self {
            read_touch_ttl: ReadTouchTTL::ServerDefault,
            filter_expression: None,
        }
    }
}
