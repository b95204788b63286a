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

use std::sync::mpsc;
use std::sync::Arc;
use std::vec::Vec;

use aerospike_core::errors::{Error, Result};
use aerospike_core::{BatchPolicy, BatchRead, ClientPolicy, Node, ToHosts};
use futures::executor::block_on;
use threadpool::ThreadPool;

/// Instantiate a Client instance to access an Aerospike database cluster and perform batch read
/// operations against it.
///
/// The client is thread-safe. Only one client instance should be used per cluster. Multiple
/// threads should share this cluster instance.
pub struct Client {
    async_client: Arc<aerospike_core::Client>,
    thread_pool: ThreadPool,
}

unsafe impl Send for Client {}
unsafe impl Sync for Client {}

impl Client {
    /// Initializes Aerospike client with suitable hosts to seed the cluster map. The client policy
    /// is used to set defaults and size internal data structures, including the worker thread pool
    /// backing concurrent batch reads. For each host connection that succeeds, the client will:
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
    /// use aerospike_sync::Client;
    /// use aerospike_core::ClientPolicy;
    ///
    /// let hosts = std::env::var("AEROSPIKE_HOSTS").unwrap();
    /// let client = Client::new(&ClientPolicy::default(), &hosts).unwrap();
    /// ```
    pub fn new(policy: &ClientPolicy, hosts: &(dyn ToHosts + Send + Sync)) -> Result<Self> {
        let client = block_on(aerospike_core::Client::new(policy, hosts))?;
        Ok(Client {
            async_client: Arc::new(client),
            thread_pool: ThreadPool::new(policy.thread_pool_size),
        })
    }

    /// Closes the connection to the Aerospike cluster.
    pub fn close(&self) -> Result<()> {
        block_on(self.async_client.close())?;
        Ok(())
    }

    /// Returns `true` if the client is connected to any cluster nodes.
    pub fn is_connected(&self) -> bool {
        block_on(self.async_client.is_connected())
    }

    /// Returns a list of the names of the active server nodes in the cluster.
    pub fn node_names(&self) -> Vec<String> {
        block_on(self.async_client.node_names())
    }

    /// Return node given its name.
    pub fn get_node(&self, name: &str) -> Result<Arc<Node>> {
        block_on(self.async_client.get_node(name))
    }

    /// Returns a list of active server nodes in the cluster.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        block_on(self.async_client.nodes())
    }

    /// Read multiple records for the given batch keys in one batch call. This method allows
    /// different namespaces/bins to be requested for each key in the batch. If a key has no
    /// matching record on the server, the corresponding `BatchRead::record` is `None`. Requires
    /// Aerospike Server version >= 3.6.0.
    ///
    /// Keys are first sharded by owning node on the calling thread. If `policy.concurrency`
    /// requests concurrent execution and more than one node is involved, each node's sub-batch is
    /// submitted to the client's worker thread pool and run independently; the calling thread then
    /// collects the per-node completions off a shared channel. Otherwise nodes are visited one at
    /// a time on the calling thread. Only the first node-level error is returned; all other
    /// sub-batches still run to completion so as many record slots as possible get filled in.
    ///
    /// # Examples
    ///
    /// Fetch multiple records in a single client request.
    ///
    /// ```rust,edition2018
    /// # #[macro_use] extern crate aerospike_core;
    /// # use std::sync::Arc;
    /// # use aerospike_sync::Client;
    /// # use aerospike_core::{BatchPolicy, BatchRead, Bins, ClientPolicy};
    /// # let hosts = std::env::var("AEROSPIKE_HOSTS").unwrap();
    /// # let client = Client::new(&ClientPolicy::default(), &hosts).unwrap();
    /// let bins = Arc::new(Bins::from(["name", "age"]));
    /// let mut batch_reads = vec![];
    /// for i in 0..10 {
    ///     batch_reads.push(BatchRead::new(as_key!("test", "test", i), bins.clone()));
    /// }
    /// match client.batch_read(&BatchPolicy::default(), batch_reads) {
    ///     Ok(results) => {
    ///         for result in results {
    ///             match result.record {
    ///                 Some(record) => println!("{:?} => {:?}", result.key, record.bins),
    ///                 None => println!("No such record: {:?}", result.key),
    ///             }
    ///         }
    ///     }
    ///     Err(err) => println!("Error executing batch request: {}", err),
    /// }
    /// ```
    pub fn batch_read(
        &self,
        policy: &BatchPolicy,
        batch_reads: Vec<BatchRead>,
    ) -> Result<Vec<BatchRead>> {
        let by_node = block_on(
            self.async_client
                .shard_batch_by_node(policy, batch_reads),
        )?;

        if !policy.concurrency.is_concurrent() || by_node.len() <= 1 {
            return self.run_sequential(policy, by_node);
        }
        self.run_concurrent(policy, by_node)
    }

    fn run_sequential(
        &self,
        policy: &BatchPolicy,
        by_node: std::collections::HashMap<Arc<Node>, Vec<BatchRead>>,
    ) -> Result<Vec<BatchRead>> {
        let mut reads = Vec::new();
        let mut first_error = None;
        for (node, node_reads) in by_node {
            match block_on(
                self.async_client
                    .execute_batch_read_on_node(policy, node, node_reads),
            ) {
                Ok(mut completed) => reads.append(&mut completed),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(reads),
        }
    }

    /// Submits one task per node to the shared worker thread pool and collects results from a
    /// completion channel. The pool itself (sized from `ClientPolicy::thread_pool_size` at
    /// construction) bounds how many sub-batches actually run at once; excess submissions queue
    /// behind it. Only the first node-level error is surfaced; every other submitted node still
    /// runs to completion and its records are kept.
    fn run_concurrent(
        &self,
        policy: &BatchPolicy,
        by_node: std::collections::HashMap<Arc<Node>, Vec<BatchRead>>,
    ) -> Result<Vec<BatchRead>> {
        let (tx, rx) = mpsc::channel();
        let mut submitted = 0usize;

        for (node, node_reads) in by_node {
            let async_client = self.async_client.clone();
            let policy = policy.clone();
            let tx = tx.clone();
            self.thread_pool.execute(move || {
                let result = block_on(async_client.execute_batch_read_on_node(
                    &policy, node, node_reads,
                ));
                // Ignore send errors: the receiver only disconnects after collecting
                // `submitted` completions below, which can't happen before this send.
                let _ = tx.send(result);
            });
            submitted += 1;
        }
        drop(tx);

        let mut reads = Vec::new();
        let mut first_error = None;
        for _ in 0..submitted {
            match rx.recv() {
                Ok(Ok(mut completed)) => reads.append(&mut completed),
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(_) => {
                    if first_error.is_none() {
                        first_error = Some(Error::ClientError(
                            "worker thread pool dropped a batch completion".to_string(),
                        ));
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(reads),
        }
    }
}
