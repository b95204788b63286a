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

/// Read mode for AP (availability) namespaces. Ignored for SC namespaces,
/// which use `ReadModeSC` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadModeAP {
    /// Read only the node the command was routed to. This is the default.
    One,

    /// Read all replicas of the partition and reconcile, at a higher request
    /// cost, to protect against a stale single replica.
    All,
}

impl Default for ReadModeAP {
    fn default() -> Self {
        ReadModeAP::One
    }
}

/// Read mode for SC (strong consistency) namespaces. Ignored for AP
/// namespaces, which use `ReadModeAP` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadModeSC {
    /// Ensures this client sees a consistent view of the record history,
    /// always reading the master partition. This is the default.
    Session,

    /// Ensures ALL clients see a consistent view of the record history. A
    /// `Replica::PreferRack` policy is downgraded to `Replica::Sequence`
    /// because rack affinity cannot be honored alongside linearizability.
    Linearize,

    /// Allows reads to return a replica that may not have received the
    /// latest write, in exchange for availability during network partitions.
    AllowReplica,

    /// Allows reads to continue in the rare case that the partition is
    /// unavailable under strong consistency (e.g. during certain multi-node
    /// failure scenarios).
    AllowUnavailable,
}

impl Default for ReadModeSC {
    fn default() -> Self {
        ReadModeSC::Session
    }
}
