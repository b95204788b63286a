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

#![warn(missing_docs)]
#![doc(test(attr(
    allow(unused_variables),
    allow(unused_assignments),
    allow(unused_mut),
    allow(unused_attributes),
    allow(dead_code),
    deny(warnings)
)))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
    clippy::copy_iterator,
    clippy::fallible_impl_from,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::too_many_lines,
    unknown_lints,
    clippy::unseparated_literal_suffix,
    clippy::unused_self,
    clippy::use_self,
    clippy::missing_errors_doc
)]

//! A pure-rust client for batch-reading records from an Aerospike cluster.
//!
//! Aerospike is an enterprise-class, NoSQL database solution for real-time operational
//! applications, delivering predictable performance at scale, superior uptime, and high
//! availability at the lowest TCO compared to first-generation NoSQL and relational databases. For
//! more information please refer to <https://www.aerospike.com/>.
//!
//! This crate covers the batch-read path only: resolving a batch of keys to the cluster nodes
//! that own their partitions, encoding/decoding the batch-index wire protocol, and running the
//! resulting per-node sub-batches with retry. Record mutation, UDFs, secondary-index queries,
//! scans, cluster topology discovery and the TLS/auth handshake beyond a plain user/password
//! login are out of scope.
//!
//! # Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```text
//! [dependencies]
//! aerospike = "2.0"
//! ```
//!
//! # Examples
//!
//! ```rust,edition2018
//! use std::sync::Arc;
//!
//! use aerospike::{BatchPolicy, BatchRead, Bins, Client, ClientPolicy};
//!
//! # async fn f() -> aerospike::errors::Result<()> {
//! let hosts = std::env::var("AEROSPIKE_HOSTS").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
//! let client = Client::new(&ClientPolicy::default(), &hosts).await?;
//!
//! let bins = Arc::new(Bins::from(["name", "age"]));
//! let batch_reads = (0..10)
//!     .map(|i| BatchRead::new(as_key!("test", "test", i), bins.clone()))
//!     .collect();
//!
//! let results = client.batch_read(&BatchPolicy::default(), batch_reads).await?;
//! for result in results {
//!     println!("{:?} => {:?}", result.key, result.record);
//! }
//! # Ok(())
//! # }
//! ```

extern crate base64;
extern crate byteorder;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate pwhash;

pub use batch::{BatchRead, BatchReadPolicy};
pub use bin::{Bin, Bins};
pub use client::Client;
pub use cluster::Node;
pub use commands::particle_type::ParticleType;
pub use errors::{Error, Result};
pub use expressions::FilterExpression;
pub use key::Key;
pub use net::Host;
pub use net::ToHosts;
pub use policy::{
    BatchPolicy, ClientPolicy, Concurrency, Policy, Priority, ReadModeAP, ReadModeSC, ReadTouchTTL,
    Replica,
};
pub use record::Record;
pub use result_code::ResultCode;
pub use value::{FloatValue, Value};

#[macro_use]
pub mod errors;
#[macro_use]
mod value;
#[macro_use]
mod bin;
#[macro_use]
mod key;
mod batch;
mod client;
mod cluster;
mod commands;
pub mod expressions;
mod msgpack;
mod net;
pub mod policy;
mod record;
mod result_code;

#[cfg(test)]
extern crate hex;
