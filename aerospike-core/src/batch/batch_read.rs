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

use std::sync::Arc;

use crate::Bins;
use crate::Key;
use crate::Record;
use crate::ResultCode;

/// Key and bin names used in batch read commands where variable bins are needed for each key.
///
/// `bins` is held behind an `Arc` so that callers who reuse the same selector across many keys
/// (the common case) give the wire encoder a cheap, reliable way to detect that two consecutive
/// entries want the same bins: pointer equality, not a field-by-field comparison.
#[derive(Debug, Clone)]
pub struct BatchRead {
    /// Key.
    pub key: Key,

    /// Bins to retrieve for this key.
    pub bins: Arc<Bins>,

    /// Will contain the record after the batch read operation.
    pub record: Option<Record>,

    /// Per-record result code, set once the batch response has been parsed.
    pub result_code: Option<ResultCode>,
}

impl BatchRead {
    /// Create a new `BatchRead` instance for the given key and bin selector.
    pub fn new(key: Key, bins: Arc<Bins>) -> Self {
        BatchRead {
            key,
            bins,
            record: None,
            result_code: None,
        }
    }

    /// Whether this entry can be encoded as a repeat of `prev` (repeat_flag=1), skipping the
    /// namespace/set/bin-selection fields on the wire. Bin-selection identity is checked by
    /// reference: two logically-identical but separately constructed `Bins` values do not match.
    #[doc(hidden)]
    pub fn match_header(&self, prev: &BatchRead, match_set: bool) -> bool {
        let key = &self.key;
        let prev_key = &prev.key;
        key.namespace == prev_key.namespace
            && (!match_set || key.set_name == prev_key.set_name)
            && Arc::ptr_eq(&self.bins, &prev.bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn key(namespace: &str, set_name: &str, k: i64) -> Key {
        Key::new(namespace, set_name, Value::from(k)).unwrap()
    }

    #[test]
    fn same_namespace_set_and_bins_match() {
        let bins = Arc::new(Bins::from(["a"]));
        let prev = BatchRead::new(key("test", "demo", 1), bins.clone());
        let next = BatchRead::new(key("test", "demo", 2), bins);
        assert!(next.match_header(&prev, true));
    }

    #[test]
    fn different_set_blocks_match_when_set_checked() {
        let bins = Arc::new(Bins::from(["a"]));
        let prev = BatchRead::new(key("test", "demo", 1), bins.clone());
        let next = BatchRead::new(key("test", "other", 2), bins);
        assert!(!next.match_header(&prev, true));
        assert!(next.match_header(&prev, false));
    }

    #[test]
    fn different_namespace_never_matches() {
        let bins = Arc::new(Bins::from(["a"]));
        let prev = BatchRead::new(key("test", "demo", 1), bins.clone());
        let next = BatchRead::new(key("other", "demo", 2), bins);
        assert!(!next.match_header(&prev, false));
    }

    #[test]
    fn equal_but_distinct_bins_do_not_match() {
        let prev = BatchRead::new(key("test", "demo", 1), Arc::new(Bins::from(["a"])));
        let next = BatchRead::new(key("test", "demo", 2), Arc::new(Bins::from(["a"])));
        assert!(!next.match_header(&prev, true));
    }
}
