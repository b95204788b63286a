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

pub mod connection;
pub mod connection_pool;
mod parser;
pub mod pipeline;

pub use self::connection::Connection;
pub use self::connection_pool::{ConnectionPool, PooledConnection};
pub use self::pipeline::{PipelinePool, PooledPipelineConnection};

use std::fmt;

use self::parser::Parser;
use crate::errors::Result;

const DEFAULT_PORT: u16 = 3000;

/// A `Host` is an address/port pair identifying a single cluster node or seed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Host {
    /// Hostname or IP address of the host.
    pub name: String,

    /// Port number for the host.
    pub port: u16,
}

impl Host {
    /// Create a new `Host` instance.
    pub fn new(name: &str, port: u16) -> Self {
        Host {
            name: name.to_string(),
            port,
        }
    }

    /// The `host:port` address string used to open a TCP connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.name, self.port)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

/// Converts a value into a list of seed hosts to connect to.
pub trait ToHosts {
    /// Convert to a `Vec<Host>`.
    fn to_hosts(&self) -> Result<Vec<Host>>;
}

impl ToHosts for Vec<Host> {
    fn to_hosts(&self) -> Result<Vec<Host>> {
        Ok(self.clone())
    }
}

impl ToHosts for String {
    fn to_hosts(&self) -> Result<Vec<Host>> {
        Parser::new(self, DEFAULT_PORT).read_hosts()
    }
}

impl<'a> ToHosts for &'a str {
    fn to_hosts(&self) -> Result<Vec<Host>> {
        Parser::new(self, DEFAULT_PORT).read_hosts()
    }
}
