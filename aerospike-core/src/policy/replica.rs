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

/// Defines the algorithm used to select the target node for a read command.
/// Affects single-record and batch-read commands only; writes always go to
/// the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replica {
    /// Read from the partition master node.
    Master,

    /// Read from the master, falling back to a prole (replica) if the master
    /// is not available. Always starts at the master.
    MasterProles,

    /// Distribute reads across master and prole nodes in round-robin order,
    /// using a per-partition sequence counter. Amortizes read load across all
    /// replicas of a partition over many requests.
    Sequence,

    /// Like `Sequence`, but prefers a replica in the same rack as the client,
    /// falling back to the normal sequence when no rack-local replica is
    /// available. Not valid for linearizable (SC `LINEARIZE`) reads, which
    /// downgrade this to `Sequence` (see `ConsistencyLevel`).
    PreferRack,
}

impl Default for Replica {
    fn default() -> Self {
        Replica::Sequence
    }
}
