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

/// Specifies whether a batch, which spans multiple cluster nodes, should be
/// executed sequentially, one node at a time, or fanned out across the
/// client's worker thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// Issue per-node sub-batches sequentially on the calling thread. Stops on
    /// the first node-level error. This is the default.
    Sequential,

    /// Issue a sub-batch per node in parallel on the shared worker thread pool.
    Parallel,

    /// Issue up to N sub-batches in parallel. When a sub-batch completes, the
    /// next queued one is submitted, until all are complete. Bounds the number
    /// of worker threads borrowed for very wide clusters.
    MaxThreads(usize),
}

impl Default for Concurrency {
    fn default() -> Self {
        Concurrency::Sequential
    }
}

impl Concurrency {
    /// Whether this mode fans sub-batches out across more than one thread.
    pub const fn is_concurrent(self) -> bool {
        !matches!(self, Concurrency::Sequential)
    }
}
