// Copyright 2015-2018 Aerospike, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::str;
use std::sync::Arc;
use std::vec::Vec;

use crate::cluster::node;
use crate::cluster::Node;
use crate::commands::Message;
use crate::errors::{Error, Result};
use crate::net::Connection;

const REPLICAS_NAME: &str = "replicas-all";

/// Per-namespace partition ownership across every replica the server
/// reports. `replicas[0]` is the master map, `replicas[1..]` are proles in
/// sequence order.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub replicas: Vec<Vec<Option<Arc<Node>>>>,
}

impl Partitions {
    fn with_replica_count(replica_count: usize) -> Self {
        let mut replicas = Vec::with_capacity(replica_count);
        for _ in 0..replica_count {
            replicas.push(vec![None; node::PARTITIONS]);
        }
        Partitions { replicas }
    }

    fn ensure_replica_count(&mut self, replica_count: usize) {
        while self.replicas.len() < replica_count {
            self.replicas.push(vec![None; node::PARTITIONS]);
        }
    }
}

/// Parses the `replicas-all` info command response into the cluster's
/// per-namespace partition map.
#[derive(Debug, Clone)]
pub struct PartitionTokenizer {
    buffer: Vec<u8>,
}

impl PartitionTokenizer {
    pub async fn new(conn: &mut Connection) -> Result<Self> {
        let info_map = Message::info(conn, &[REPLICAS_NAME]).await?;
        if let Some(buf) = info_map.get(REPLICAS_NAME) {
            return Ok(PartitionTokenizer {
                buffer: buf.as_bytes().to_owned(),
            });
        }
        bail!(Error::BadResponse("Missing replicas info".to_string()))
    }

    /// Updates `nmap` in place with this node's reported partition
    /// ownership, growing each namespace's replica count as needed.
    ///
    /// Wire format: `<ns>:<replica-idx>,<base64 bitmap>;...`, one entry per
    /// (namespace, replica index) pair this node owns partitions for.
    pub fn update_partition(
        &self,
        nmap: &mut HashMap<String, Partitions>,
        node: Arc<Node>,
    ) -> Result<()> {
        let part_str = str::from_utf8(&self.buffer)?;
        for part in part_str.trim_end_matches(';').split(';') {
            if part.is_empty() {
                continue;
            }
            let (ns, rest) = part
                .split_once(':')
                .ok_or_else(|| Error::BadResponse("Error parsing partition info".to_string()))?;
            let (replica_idx, encoded) = match rest.split_once(',') {
                Some((idx, enc)) => (idx.parse().unwrap_or(0), enc),
                None => (0usize, rest),
            };

            let restore_buffer = base64::decode(encoded)?;
            let entry = nmap
                .entry(ns.to_string())
                .or_insert_with(|| Partitions::with_replica_count(replica_idx + 1));
            entry.ensure_replica_count(replica_idx + 1);

            let replica = &mut entry.replicas[replica_idx];
            for (idx, item) in replica.iter_mut().enumerate() {
                if restore_buffer[idx >> 3] & (0x80 >> (idx & 7) as u8) != 0 {
                    *item = Some(node.clone());
                }
            }
        }

        Ok(())
    }
}
