// Copyright 2015-2017 Aerospike, Inc.
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

use aerospike_rt::time::Duration;

/// `ClientPolicy` encapsulates parameters for the cluster connection itself,
/// as opposed to parameters governing a single operation.
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    /// User authentication to cluster. Leave `None` for clusters running
    /// without restricted access.
    pub user_password: Option<(String, String)>,

    /// Initial host connection timeout. Timeout when opening a connection to
    /// a server host for the first time.
    pub timeout: Option<Duration>,

    /// Connection idle timeout. Every time a connection is used its idle
    /// deadline is extended by this duration; once reached, the connection is
    /// closed and discarded from the pool rather than reused.
    pub idle_timeout: Option<Duration>,

    /// Maximum number of pipelined connections to open per node. The
    /// pipeline multiplexer prefers opening new connections up to this cap
    /// before handing out an existing one from the pool.
    pub connection_pool_size_per_node: usize,

    /// Throw an error if the initial seed connection fails.
    pub fail_if_not_connected: bool,

    /// Interval for checking for cluster state changes. Minimum possible
    /// interval is 10 milliseconds. Cluster tending itself is maintained by
    /// an external collaborator; this governs how often this client asks it
    /// to refresh.
    pub tend_interval: Duration,

    /// Expected cluster name. If set, each seed and discovered node's
    /// reported cluster name must match, or the node is rejected.
    pub cluster_name: Option<String>,

    /// Size of the synchronous batch executor's shared worker thread pool.
    pub thread_pool_size: usize,

    /// A IP translation table for cases where different clients use
    /// different server IP addresses to reach the same node.
    pub ip_map: Option<HashMap<String, String>>,

    /// Use `services-alternate` instead of `services` in info requests during
    /// cluster tending to obtain externally-routable node addresses.
    pub use_services_alternate: bool,

    /// Connection buffers greater than this size are freed instead of being
    /// kept around for reuse once a command has finished with them.
    pub buffer_reclaim_threshold: usize,
}

impl Default for ClientPolicy {
    fn default() -> ClientPolicy {
        ClientPolicy {
            user_password: None,
            timeout: Some(Duration::new(30, 0)),
            idle_timeout: Some(Duration::new(5, 0)),
            connection_pool_size_per_node: 256,
            fail_if_not_connected: true,
            tend_interval: Duration::new(1, 0),
            cluster_name: None,
            thread_pool_size: 128,
            ip_map: None,
            use_services_alternate: false,
            buffer_reclaim_threshold: 65536,
        }
    }
}
