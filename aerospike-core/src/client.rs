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

use std::collections::HashMap;
use std::sync::Arc;
use std::vec::Vec;

use crate::batch::BatchExecutor;
use crate::cluster::{Cluster, Node};
use crate::errors::Result;
use crate::net::ToHosts;
use crate::policy::{BatchPolicy, ClientPolicy};
use crate::BatchRead;

/// Instantiate a Client instance to access an Aerospike database cluster and perform batch read
/// operations against it.
///
/// The client is thread-safe. Only one client instance should be used per cluster. Multiple
/// threads should share this cluster instance.
pub struct Client {
    cluster: Arc<Cluster>,
}

unsafe impl Send for Client {}
unsafe impl Sync for Client {}

impl Client {
    /// Initializes Aerospike client with suitable hosts to seed the cluster map. The client policy
    /// is used to set defaults and size internal data structures. For each host connection that
    /// succeeds, the client will:
    ///
    /// - Add host to the cluster map
    /// - Request host's list of other nodes in cluster
    /// - Add these nodes to the cluster map
    ///
    /// In most cases, only one host is necessary to seed the cluster. The remaining hosts are
    /// added as future seeds in case of a complete network failure.
    ///
    /// The seed hosts to connect to (one or more) can be specified as a comma-separated list of
    /// hostnames or IP addresses with optional port numbers, e.g.
    ///
    /// ```text
    /// 10.0.0.1:3000,10.0.0.2:3000,10.0.0.3:3000
    /// ```
    ///
    /// Port 3000 is used by default if the port number is omitted for any of the hosts.
    ///
    /// # Examples
    ///
    /// Using an environment variable to set the list of seed hosts.
    ///
    /// ```rust,edition2018
    /// use aerospike::{Client, ClientPolicy};
    ///
    /// let hosts = std::env::var("AEROSPIKE_HOSTS").unwrap();
    /// let client = Client::new(&ClientPolicy::default(), &hosts).await.unwrap();
    /// ```
    pub async fn new(policy: &ClientPolicy, hosts: &(dyn ToHosts + Send + Sync)) -> Result<Self> {
        let hosts = hosts.to_hosts()?;
        let cluster = Cluster::new(policy.clone(), &hosts).await?;

        Ok(Client { cluster })
    }

    /// Closes the connection to the Aerospike cluster.
    pub async fn close(&self) -> Result<()> {
        self.cluster.close().await?;
        Ok(())
    }

    /// Returns `true` if the client is connected to any cluster nodes.
    pub async fn is_connected(&self) -> bool {
        self.cluster.is_connected().await
    }

    /// Returns a list of the names of the active server nodes in the cluster.
    pub async fn node_names(&self) -> Vec<String> {
        self.cluster
            .nodes()
            .await
            .iter()
            .map(|node| node.name().to_owned())
            .collect()
    }

    /// Return node given its name.
    pub async fn get_node(&self, name: &str) -> Result<Arc<Node>> {
        self.cluster.get_node_by_name(name).await
    }

    /// Returns a list of active server nodes in the cluster.
    pub async fn nodes(&self) -> Vec<Arc<Node>> {
        self.cluster.nodes().await
    }

    /// Read multiple records for the given batch keys in one batch call. This method allows
    /// different namespaces/bins to be requested for each key in the batch. If a key has no
    /// matching record on the server, the corresponding `BatchRead::record` is `None`. The policy
    /// can be used to specify timeouts and the node-fanout concurrency mode. Requires Aerospike
    /// Server version >= 3.6.0.
    ///
    /// # Examples
    ///
    /// Fetch multiple records in a single client request.
    ///
    /// ```rust,edition2018
    /// # use aerospike::*;
    /// # use std::sync::Arc;
    ///
    /// # let hosts = std::env::var("AEROSPIKE_HOSTS").unwrap();
    /// # let client = Client::new(&ClientPolicy::default(), &hosts).await.unwrap();
    /// let bins = Arc::new(Bins::from(["name", "age"]));
    /// let mut batch_reads = vec![];
    /// for i in 0..10 {
    ///   let key = as_key!("test", "test", i);
    ///   batch_reads.push(BatchRead::new(key, bins.clone()));
    /// }
    /// match client.batch_read(&BatchPolicy::default(), batch_reads).await {
    ///     Ok(results) => {
    ///       for result in results {
    ///         match result.record {
    ///           Some(record) => println!("{:?} => {:?}", result.key, record.bins),
    ///           None => println!("No such record: {:?}", result.key),
    ///         }
    ///       }
    ///     }
    ///     Err(err)
    ///         => println!("Error executing batch request: {}", err),
    /// }
    /// ```
    pub async fn batch_read(
        &self,
        policy: &BatchPolicy,
        batch_reads: Vec<BatchRead>,
    ) -> Result<Vec<BatchRead>> {
        let executor = BatchExecutor::new(self.cluster.clone());
        executor.execute_batch_read(policy, batch_reads).await
    }

    /// Groups `batch_reads` by the node that currently owns each key's partition. Intended for
    /// callers that drive their own per-node fan-out (e.g. a blocking thread pool) rather than
    /// the concurrency-bounded async stream used by [`Self::batch_read`].
    #[doc(hidden)]
    pub async fn shard_batch_by_node(
        &self,
        policy: &BatchPolicy,
        batch_reads: Vec<BatchRead>,
    ) -> Result<HashMap<Arc<Node>, Vec<BatchRead>>> {
        let executor = BatchExecutor::new(self.cluster.clone());
        executor.shard_by_node(policy, &batch_reads).await
    }

    /// Runs a single node's already-sharded sub-batch to completion, including this client's
    /// normal per-key replica retries. Companion to [`Self::shard_batch_by_node`].
    #[doc(hidden)]
    pub async fn execute_batch_read_on_node(
        &self,
        policy: &BatchPolicy,
        node: Arc<Node>,
        batch_reads: Vec<BatchRead>,
    ) -> Result<Vec<BatchRead>> {
        let executor = BatchExecutor::new(self.cluster.clone());
        executor.execute_on_node(policy, node, batch_reads).await
    }
}
