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

//! Error and Result types for the Aerospike client.
//!
//! # Examples
//!
//! Handling an error returned by the client.
//!
//! ```rust,edition2018
//! use aerospike::*;
//!
//! # async fn f() -> errors::Result<()> {
//! let hosts = std::env::var("AEROSPIKE_HOSTS").unwrap();
//! let policy = ClientPolicy::default();
//! let client = Client::new(&policy, &hosts).await?;
//! let key = as_key!("test", "test", "someKey");
//! match client.batch_get(&BatchPolicy::default(), vec![BatchRead::new(key, Bins::All)]).await {
//!     Ok(reads) => println!("{} reads completed", reads.len()),
//!     Err(Error::ServerError(rc)) => println!("server error: {}", rc),
//!     Err(err) => println!("error fetching records: {}", err),
//! }
//! # Ok(())
//! # }
//! ```

use std::net::AddrParseError;
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::sync::mpsc::RecvError;

use crate::result_code::ResultCode;

use thiserror::Error;

/// Aerospike Client Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error variants raised by the client. A `Result::Err` always carries one of these.
#[derive(Error, Debug)]
pub enum Error {
    /// The client received a server response it was not able to process.
    #[error("Bad Server Response: {0}")]
    BadResponse(String),

    /// The client was not able to communicate with the cluster due to some issue with the
    /// network connection. Commands wrapping this variant are eligible for retry.
    #[error("Unable to communicate with server cluster: {0}")]
    Connection(String),

    /// One or more of the arguments passed to the client are invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cluster node failed validation, or no node could be found for the request.
    #[error("Invalid cluster node: {0}")]
    InvalidNode(String),

    /// The partition map has no live owner for the requested partition under the
    /// requested replica policy.
    #[error("Invalid node for partition: {0}")]
    InvalidPartition(String),

    /// Exceeded max. number of connections per node. Classified as a retriable
    /// condition with the same backoff as `Timeout` (see Design Notes Open Question).
    #[error("Too many connections, or connection pool is empty")]
    NoMoreConnections,

    /// A task timed out before it could be completed.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error returned when executing a User-Defined Function (UDF) resulted in an error.
    #[error("UDF Bad Response: {0}")]
    UdfBadResponse(String),

    /// Server responded with a response code indicating an error condition that is
    /// not one of the benign per-record statuses (`KeyNotFoundError`/`FilteredOut`).
    #[error("Server error: {0}")]
    ServerError(ResultCode),

    /// A response violated a protocol invariant the client relies on, e.g. a batch
    /// index outside the range of the submitted batch. Always fatal to the operation.
    #[error("Protocol violation: {0}")]
    ClientError(String),

    /// Wraps an I/O error bubbled up from the transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error interpreting a sequence of bytes as a UTF-8 encoded string.
    #[error(transparent)]
    InvalidUtf8(#[from] Utf8Error),

    /// Error decoding a Base64 encoded value.
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    /// Error parsing an integer.
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),

    /// Error parsing an IP or socket address.
    #[error(transparent)]
    ParseAddr(#[from] AddrParseError),

    /// Error returned from the `recv` function on an MPSC `Receiver`.
    #[error(transparent)]
    MpscRecv(#[from] RecvError),

    /// Error returned while hashing a password for user authentication.
    #[error(transparent)]
    PwHash(#[from] pwhash::error::Error),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::ClientError(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::ClientError(s.to_string())
    }
}

/// Returns an `Err` built from a `Error`-convertible value or a format string. Mirrors
/// the ergonomics of `error_chain`'s `bail!` without the macro crate.
#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::from($e))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::Error::ClientError(format!($fmt, $($arg)*)))
    };
}

macro_rules! log_error_chain {
    ($err:expr, $($arg:tt)*) => {
        error!($($arg)*);
        error!("Error: {}", $err);
    };
}

pub(crate) use log_error_chain;
