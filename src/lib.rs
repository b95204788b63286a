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

//! A pure-rust client for batch-reading records from an Aerospike cluster.
//!
//! This crate is a thin facade over the `async` ([`aerospike-core`]) and `sync`
//! ([`aerospike-sync`]) client implementations, selected via Cargo features. Enable `async`
//! (the default, paired with `rt-tokio` or `rt-async-std`) to drive the client from inside an
//! existing async runtime, or `sync` to get a blocking API backed by the same wire protocol and
//! cluster logic.
//!
//! Enabling both features at once is unusual but not prevented; in that case both `Client` types
//! are reachable through their originating crates rather than through this top-level re-export.

#[cfg(feature = "async")]
pub use aerospike_core::*;

#[cfg(all(feature = "sync", not(feature = "async")))]
pub use aerospike_sync::*;
