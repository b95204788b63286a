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

//! Policy types encapsulate optional parameters for various client operations.
#![allow(clippy::missing_errors_doc)]

mod batch_policy;
mod client_policy;
mod concurrency;
mod priority;
mod read_mode;
mod read_touch_ttl_percent;
mod replica;

pub use self::batch_policy::BatchPolicy;
pub use self::client_policy::ClientPolicy;
pub use self::concurrency::Concurrency;
pub use self::priority::Priority;
pub use self::read_mode::{ReadModeAP, ReadModeSC};
pub use self::read_touch_ttl_percent::ReadTouchTTL;
pub use self::replica::Replica;

use crate::expressions::FilterExpression;
use aerospike_rt::time::{Duration, Instant};

/// Trait implemented by all policy types; each encompasses an instance of `BasePolicy`.
pub trait Policy {
    /// Transaction priority.
    fn priority(&self) -> &Priority;

    #[doc(hidden)]
    /// Deadline for current transaction based on specified timeout. For internal use only.
    fn deadline(&self) -> Option<Instant>;

    /// Whole-operation deadline, starting when the command is dispatched. Tracked on the
    /// client and sent to the server in the wire protocol.
    fn total_timeout(&self) -> Option<Duration>;

    /// Per-socket I/O ceiling. Zero or `None` means unlimited.
    fn socket_timeout(&self) -> Option<Duration>;

    /// Maximum number of retries before aborting the current transaction. A retry may be
    /// attempted when there is a network error. If `max_retries` is exceeded, the abort
    /// occurs even if the timeout has not yet elapsed.
    fn max_retries(&self) -> Option<usize>;

    /// Time to sleep between retries. Set to zero to skip sleep.
    fn sleep_between_retries(&self) -> Option<Duration>;

    /// AP (availability) namespace read mode.
    fn read_mode_ap(&self) -> ReadModeAP;

    /// SC (strong consistency) namespace read mode.
    fn read_mode_sc(&self) -> ReadModeSC;
}

#[doc(hidden)]
/// Policy-like object that encapsulates a base policy instance.
pub trait PolicyLike {
    /// Retrieve a reference to the base policy.
    fn base(&self) -> &BasePolicy;
}

impl<T> Policy for T
where
    T: PolicyLike,
{
    fn priority(&self) -> &Priority {
        self.base().priority()
    }

    fn deadline(&self) -> Option<Instant> {
        self.base().deadline()
    }

    fn total_timeout(&self) -> Option<Duration> {
        self.base().total_timeout()
    }

    fn socket_timeout(&self) -> Option<Duration> {
        self.base().socket_timeout()
    }

    fn max_retries(&self) -> Option<usize> {
        self.base().max_retries()
    }

    fn sleep_between_retries(&self) -> Option<Duration> {
        self.base().sleep_between_retries()
    }

    fn read_mode_ap(&self) -> ReadModeAP {
        self.base().read_mode_ap()
    }

    fn read_mode_sc(&self) -> ReadModeSC {
        self.base().read_mode_sc()
    }
}

/// Common parameters shared by all policy types.
#[derive(Debug, Clone)]
pub struct BasePolicy {
    /// Priority of the request relative to other transactions.
    pub priority: Priority,

    /// Whole-operation deadline; starts at dispatch.
    pub total_timeout: Option<Duration>,

    /// Per-socket I/O ceiling. `None` means unlimited.
    pub socket_timeout: Option<Duration>,

    /// Maximum number of retries before aborting the current transaction.
    /// A retry is attempted when there is a network error other than timeout.
    pub max_retries: Option<usize>,

    /// Duration to sleep between retries if a transaction fails and the
    /// timeout was not exceeded. Zero skips the sleep.
    pub sleep_between_retries: Option<Duration>,

    /// Read mode for AP (availability) namespaces.
    pub read_mode_ap: ReadModeAP,

    /// Read mode for SC (strong consistency) namespaces.
    pub read_mode_sc: ReadModeSC,

    /// Determines how record TTL is affected by this read.
    pub read_touch_ttl: ReadTouchTTL,

    /// Optional server-side predicate expression.
    pub filter_expression: Option<FilterExpression>,
}

impl Policy for BasePolicy {
    fn priority(&self) -> &Priority {
        &self.priority
    }

    fn deadline(&self) -> Option<Instant> {
        self.total_timeout.map(|timeout| Instant::now() + timeout)
    }

    fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout
    }

    fn socket_timeout(&self) -> Option<Duration> {
        self.socket_timeout
    }

    fn max_retries(&self) -> Option<usize> {
        self.max_retries
    }

    fn sleep_between_retries(&self) -> Option<Duration> {
        self.sleep_between_retries
    }

    fn read_mode_ap(&self) -> ReadModeAP {
        self.read_mode_ap
    }

    fn read_mode_sc(&self) -> ReadModeSC {
        self.read_mode_sc
    }
}

impl Default for BasePolicy {
    fn default() -> BasePolicy {
        BasePolicy {
            priority: Priority::default(),
            total_timeout: Some(Duration::new(30, 0)),
            socket_timeout: None,
            max_retries: Some(2),
            sleep_between_retries: Some(Duration::new(0, 500_000_000)),
            read_mode_ap: ReadModeAP::default(),
            read_mode_sc: ReadModeSC::default(),
            read_touch_ttl: ReadTouchTTL::ServerDefault,
            filter_expression: None,
        }
    }
}

impl BasePolicy {
    /// Get the optional server-side predicate expression.
    pub const fn filter_expression(&self) -> &Option<FilterExpression> {
        &self.filter_expression
    }
}
