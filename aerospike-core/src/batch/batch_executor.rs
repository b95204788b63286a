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

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::batch::BatchRead;
use crate::cluster::partition::Partition;
use crate::cluster::{Cluster, Node};
use crate::commands::batch_read_command::BatchReadCommand;
use crate::errors::{Error, Result};
use crate::policy::{BatchPolicy, Concurrency};
use crate::ResultCode;

/// Shards a batch of reads across the cluster nodes that own them and fans the per-node
/// sub-batches out according to the policy's `Concurrency` setting.
pub struct BatchExecutor {
    cluster: Arc<Cluster>,
}

impl BatchExecutor {
    pub fn new(cluster: Arc<Cluster>) -> Self {
        BatchExecutor { cluster }
    }

    pub async fn execute_batch_read(
        &self,
        policy: &BatchPolicy,
        batch_reads: Vec<BatchRead>,
    ) -> Result<Vec<BatchRead>> {
        let batch_nodes = self.shard_by_node(policy, &batch_reads).await?;

        let commands: Vec<BatchReadCommand> = batch_nodes
            .into_iter()
            .map(|(node, reads)| BatchReadCommand::new(policy, node, reads))
            .collect();

        let width = match policy.concurrency {
            Concurrency::Sequential => 1,
            Concurrency::Parallel => commands.len().max(1),
            Concurrency::MaxThreads(n) => n.max(1),
        };

        let cluster = &self.cluster;
        let results: Vec<Result<BatchReadCommand>> = stream::iter(commands)
            .map(|mut cmd| async move {
                cmd.execute(cluster).await?;
                Ok(cmd)
            })
            .buffer_unordered(width)
            .collect()
            .await;

        let mut reads = Vec::new();
        for result in results {
            reads.extend(result?.into_batch_reads());
        }
        Ok(reads)
    }

    /// Runs a single node's sub-batch to completion, retrying internally per
    /// [`BatchReadCommand::execute`]. Exposed so a caller that wants its own
    /// fan-out strategy (e.g. a worker thread pool) can drive one node at a
    /// time instead of going through [`Self::execute_batch_read`]'s
    /// concurrency-bounded stream.
    pub(crate) async fn execute_on_node(
        &self,
        policy: &BatchPolicy,
        node: Arc<Node>,
        batch_reads: Vec<BatchRead>,
    ) -> Result<Vec<BatchRead>> {
        let mut command = BatchReadCommand::new(policy, node, batch_reads);
        command.execute(&self.cluster).await?;
        Ok(command.into_batch_reads())
    }

    /// Groups `batch_reads` by the node that currently owns each key's partition under the
    /// policy's replica selection.
    pub(crate) async fn shard_by_node(
        &self,
        policy: &BatchPolicy,
        batch_reads: &[BatchRead],
    ) -> Result<HashMap<Arc<Node>, Vec<BatchRead>>> {
        if !batch_reads.is_empty() && self.cluster.nodes().await.is_empty() {
            bail!(Error::ServerError(ResultCode::ServerNotAvailable));
        }

        let mut map: HashMap<Arc<Node>, Vec<BatchRead>> = HashMap::new();
        for batch_read in batch_reads {
            let partition = Partition::new_by_key(&batch_read.key);
            // This client does not track per-namespace strong-consistency mode, so
            // `effective_replica` always sees sc_mode = false.
            let replica = Partition::effective_replica(
                policy.replica,
                false,
                policy.base_policy.read_mode_sc,
            );
            let (node, _is_master) = self
                .cluster
                .get_node_for_partition(&partition, replica, false)
                .await?;
            map.entry(node).or_default().push(batch_read.clone());
        }
        Ok(map)
    }
}
