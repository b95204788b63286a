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

use std::fmt;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::cluster::node;
use crate::key::Key;
use crate::policy::{ReadModeSC, Replica};

/// Identifies a single partition (namespace + partition id) to resolve against
/// the cluster's partition map.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    /// Namespace the partition belongs to.
    pub namespace: &'a str,

    /// Partition id, derived from the low bits of the key's digest.
    pub partition_id: usize,
}

impl<'a> Partition<'a> {
    /// Creates a `Partition` directly from a namespace and partition id.
    pub const fn new(namespace: &'a str, partition_id: usize) -> Self {
        Partition {
            namespace,
            partition_id,
        }
    }

    /// Derives the owning partition for `key` from the low bits of its digest.
    pub fn new_by_key(key: &'a Key) -> Self {
        let mut rdr = Cursor::new(&key.digest[0..4]);

        Partition {
            namespace: &key.namespace,

            // CAN'T USE MOD directly - mod gives negative numbers for the high
            // bit set. AND makes it positive first; for any x, y: x % 2^y ==
            // x & (2^y - 1), and the AND is the cheaper of the two anyway.
            partition_id: rdr.read_u32::<LittleEndian>().unwrap() as usize & (node::PARTITIONS - 1),
        }
    }

    /// Combines a caller-supplied replica policy with the SC consistency mode
    /// in effect for this read, per the routing rules for strongly
    /// consistent namespaces:
    ///
    /// - `SESSION` always routes to master.
    /// - `LINEARIZE` downgrades `PREFER_RACK` to `SEQUENCE`, since
    ///   linearizable reads cannot honor rack affinity.
    /// - Any other combination passes the replica policy through unchanged.
    pub fn effective_replica(replica: Replica, sc_mode: bool, read_mode_sc: ReadModeSC) -> Replica {
        if !sc_mode {
            return replica;
        }
        match read_mode_sc {
            ReadModeSC::Session => Replica::Master,
            ReadModeSC::Linearize if replica == Replica::PreferRack => Replica::Sequence,
            _ => replica,
        }
    }
}

impl<'a> PartialEq for Partition<'a> {
    fn eq(&self, other: &Partition) -> bool {
        self.namespace == other.namespace && self.partition_id == other.partition_id
    }
}

impl<'a> fmt::Display for Partition<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Partition ({}: {})", self.namespace, self.partition_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_always_routes_to_master() {
        assert_eq!(
            Partition::effective_replica(Replica::Sequence, true, ReadModeSC::Session),
            Replica::Master
        );
        assert_eq!(
            Partition::effective_replica(Replica::PreferRack, true, ReadModeSC::Session),
            Replica::Master
        );
    }

    #[test]
    fn linearize_downgrades_prefer_rack_to_sequence() {
        assert_eq!(
            Partition::effective_replica(Replica::PreferRack, true, ReadModeSC::Linearize),
            Replica::Sequence
        );
        assert_eq!(
            Partition::effective_replica(Replica::MasterProles, true, ReadModeSC::Linearize),
            Replica::MasterProles
        );
    }

    #[test]
    fn other_modes_pass_through() {
        assert_eq!(
            Partition::effective_replica(Replica::PreferRack, true, ReadModeSC::AllowReplica),
            Replica::PreferRack
        );
    }

    #[test]
    fn ap_mode_ignores_sc_read_mode() {
        assert_eq!(
            Partition::effective_replica(Replica::PreferRack, false, ReadModeSC::Session),
            Replica::PreferRack
        );
    }
}
