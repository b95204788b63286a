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

use aerospike_rt::sleep;
use aerospike_rt::time::{Duration, Instant};

use crate::cluster::partition::Partition;
use crate::cluster::{Cluster, Node};
use crate::commands::buffer;
use crate::commands::field_type::FieldType;
use crate::errors::{Error, Result};
use crate::net::Connection;
use crate::policy::{BatchPolicy, Policy, PolicyLike};
use crate::{value, BatchRead, Key, Record, ResultCode, Value};

/// Runs a batch of reads against the node that currently owns them, retrying
/// node-level failures against a fresh node and per-key failures against an
/// alternate replica until every read has a result or the policy's retry
/// budget runs out.
pub struct BatchReadCommand {
    policy: BatchPolicy,
    node: Arc<Node>,
    batch_reads: Vec<BatchRead>,
}

struct ParsedRecord {
    record: Option<Record>,
    result_code: ResultCode,
}

impl BatchReadCommand {
    pub fn new(policy: &BatchPolicy, node: Arc<Node>, batch_reads: Vec<BatchRead>) -> Self {
        BatchReadCommand {
            policy: policy.clone(),
            node,
            batch_reads,
        }
    }

    pub fn into_batch_reads(self) -> Vec<BatchRead> {
        self.batch_reads
    }

    pub async fn execute(&mut self, cluster: &Arc<Cluster>) -> Result<()> {
        let deadline = self.policy.base_policy.deadline();
        let mut iteration = 0_usize;

        loop {
            let completed = if iteration == 0 {
                Self::request_group(&self.node, &self.policy, &mut self.batch_reads).await?
            } else {
                Self::request_per_key(cluster, &self.policy, &mut self.batch_reads, &self.node).await?
            };

            if completed {
                return Ok(());
            }

            iteration += 1;
            if let Some(max_retries) = self.policy.base_policy.max_retries {
                if iteration > max_retries {
                    bail!(Error::Timeout(format!(
                        "batch read exhausted {} retries",
                        max_retries
                    )));
                }
            }
            if let Some(sleep_between) = self.policy.base_policy.sleep_between_retries {
                sleep(sleep_between).await;
            }
            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    bail!(Error::Timeout("batch read deadline exceeded".to_string()));
                }
            }
        }
    }

    /// Sends every still-unanswered read in `batch_reads` to `node` in a
    /// single pipelined request. Returns `Ok(true)` once every read has a
    /// result code, `Ok(false)` if the node-level attempt failed and the whole
    /// group should be retried, or `Err` if the response carried a stop-batch
    /// server code or a protocol violation, both of which are fatal to the
    /// operation rather than retriable.
    async fn request_group(
        node: &Arc<Node>,
        policy: &BatchPolicy,
        batch_reads: &mut [BatchRead],
    ) -> Result<bool> {
        let pending: Vec<usize> = (0..batch_reads.len())
            .filter(|&i| batch_reads[i].result_code.is_none())
            .collect();
        if pending.is_empty() {
            return Ok(true);
        }

        let pipeline = match node.get_pipeline_connection().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!("node {}: {}", node, err);
                return Ok(false);
            }
        };

        let reads: Vec<BatchRead> = pending.iter().map(|&i| batch_reads[i].clone()).collect();
        let ticket = match pipeline
            .write_request(|conn| conn.buffer.set_batch_read(policy, &reads))
            .await
        {
            Ok(ticket) => ticket,
            Err(err) => {
                warn!("node {}: {}", node, err);
                return Ok(false);
            }
        };

        let socket_timeout = policy.base_policy.socket_timeout;
        let deserialize = policy.deserialize;
        let count = reads.len();
        let parsed = pipeline
            .read_response(ticket, move |conn| {
                Box::pin(async move {
                    Self::parse_result(conn, count, deserialize, socket_timeout).await
                })
            })
            .await;

        match parsed {
            Ok(results) => {
                for (offset, result) in results {
                    let idx = pending[offset];
                    batch_reads[idx].record = result.record;
                    batch_reads[idx].result_code = Some(result.result_code);
                }
                Ok(true)
            }
            Err(err @ (Error::ServerError(_) | Error::ClientError(_))) => {
                // A stop-batch server code or a protocol violation is fatal to the whole
                // operation, not just this node's attempt: retrying would just repeat the same
                // deterministic failure until the retry budget runs out and masks it behind a
                // `Timeout`.
                Err(err)
            }
            Err(err) => {
                warn!("node {}: {}", node, err);
                Ok(false)
            }
        }
    }

    /// Second and later retries: each still-failing read tries an alternate
    /// replica for its own partition rather than re-sharding the whole batch,
    /// since the alternate node for one key need not be the alternate node
    /// for any other key in the batch.
    async fn request_per_key(
        cluster: &Arc<Cluster>,
        policy: &BatchPolicy,
        batch_reads: &mut [BatchRead],
        prior_node: &Arc<Node>,
    ) -> Result<bool> {
        let mut all_succeeded = true;
        for batch_read in batch_reads.iter_mut() {
            if batch_read.result_code.is_some() {
                continue;
            }

            let partition = Partition::new_by_key(&batch_read.key);
            // This client does not track per-namespace strong-consistency
            // mode, so `effective_replica` always sees sc_mode = false.
            let replica = Partition::effective_replica(
                policy.replica,
                false,
                policy.base_policy.read_mode_sc,
            );
            let node = match cluster.get_node_for_partition(&partition, replica, true).await {
                Ok((node, _is_master)) => node,
                Err(err) => {
                    warn!("{}", err);
                    all_succeeded = false;
                    continue;
                }
            };
            if Arc::ptr_eq(&node, prior_node) {
                all_succeeded = false;
                continue;
            }

            let single = std::slice::from_mut(batch_read);
            if !Self::request_group(&node, policy, single).await? {
                all_succeeded = false;
            }
        }
        Ok(all_succeeded)
    }

    async fn parse_result(
        conn: &mut Connection,
        expected: usize,
        deserialize: bool,
        socket_timeout: Option<Duration>,
    ) -> Result<Vec<(usize, ParsedRecord)>> {
        let mut results = Vec::with_capacity(expected);
        loop {
            Self::read_with_timeout(conn, 8, socket_timeout).await?;
            let size = conn.buffer.read_msg_size(None);
            conn.bookmark();
            if size == 0 {
                continue;
            }

            while conn.bytes_read() < size {
                Self::read_with_timeout(
                    conn,
                    buffer::MSG_REMAINING_HEADER_SIZE as usize,
                    socket_timeout,
                )
                .await?;
                match Self::parse_record(conn, expected, deserialize, socket_timeout).await? {
                    None => return Ok(results),
                    Some(entry) => results.push(entry),
                }
            }
        }
    }

    async fn read_with_timeout(
        conn: &mut Connection,
        size: usize,
        socket_timeout: Option<Duration>,
    ) -> Result<()> {
        match socket_timeout {
            Some(timeout) => {
                aerospike_rt::timeout(timeout, conn.read_buffer(size))
                    .await
                    .map_err(|_| Error::Timeout("socket timeout waiting for batch response".to_string()))??;
            }
            None => conn.read_buffer(size).await?,
        }
        Ok(())
    }

    async fn parse_record(
        conn: &mut Connection,
        expected: usize,
        deserialize: bool,
        socket_timeout: Option<Duration>,
    ) -> Result<Option<(usize, ParsedRecord)>> {
        let info3 = conn.buffer.read_u8(Some(3));
        if info3 & buffer::INFO3_LAST == buffer::INFO3_LAST {
            return Ok(None);
        }

        let result_code = ResultCode::from(conn.buffer.read_u8(Some(5)));
        if !result_code.is_batch_record_status() {
            bail!(Error::ServerError(result_code));
        }

        conn.buffer.skip(6);
        let generation = conn.buffer.read_u32(None);
        let expiration = conn.buffer.read_u32(None);
        let batch_index = conn.buffer.read_u32(None) as usize;
        let field_count = conn.buffer.read_u16(None) as usize;
        let op_count = conn.buffer.read_u16(None) as usize;

        let key = Self::parse_key(conn, field_count, socket_timeout).await?;
        if batch_index >= expected {
            bail!(Error::ClientError(format!(
                "server returned batch index {} outside submitted batch of {}",
                batch_index, expected
            )));
        }

        let record = if result_code == ResultCode::Ok {
            let mut bins: HashMap<String, Value> = HashMap::with_capacity(op_count);
            for _ in 0..op_count {
                Self::read_with_timeout(conn, 8, socket_timeout).await?;
                let op_size = conn.buffer.read_u32(None) as usize;
                conn.buffer.skip(1);
                let particle_type = conn.buffer.read_u8(None);
                conn.buffer.skip(1);
                let name_size = conn.buffer.read_u8(None) as usize;
                Self::read_with_timeout(conn, name_size, socket_timeout).await?;
                let name = conn.buffer.read_str(name_size)?;
                let particle_bytes_size = op_size - (4 + name_size);
                Self::read_with_timeout(conn, particle_bytes_size, socket_timeout).await?;
                if deserialize {
                    let value = value::bytes_to_particle(
                        particle_type,
                        &mut conn.buffer,
                        particle_bytes_size,
                    )?;
                    bins.insert(name, value);
                } else {
                    conn.buffer.skip(particle_bytes_size);
                }
            }
            Some(Record::new(Some(key), bins, generation, expiration))
        } else {
            None
        };

        Ok(Some((
            batch_index,
            ParsedRecord { record, result_code },
        )))
    }

    /// Reads the digest/namespace/set/user-key fields that precede a
    /// record's bin operations in the wire response.
    async fn parse_key(
        conn: &mut Connection,
        field_count: usize,
        socket_timeout: Option<Duration>,
    ) -> Result<Key> {
        let mut digest = [0; 20];
        let mut namespace = String::new();
        let mut set_name = String::new();
        let mut user_key = None;

        for _ in 0..field_count {
            Self::read_with_timeout(conn, 4, socket_timeout).await?;
            let field_len = conn.buffer.read_u32(None) as usize - 1;
            let field_type = conn.buffer.read_u8(None);
            Self::read_with_timeout(conn, field_len, socket_timeout).await?;

            match field_type {
                t if t == FieldType::DigestRipe as u8 => {
                    digest.copy_from_slice(conn.buffer.read_slice(field_len));
                }
                t if t == FieldType::Namespace as u8 => {
                    namespace = conn.buffer.read_str(field_len)?;
                }
                t if t == FieldType::Table as u8 => {
                    set_name = conn.buffer.read_str(field_len)?;
                }
                t if t == FieldType::Key as u8 => {
                    let particle_type = conn.buffer.read_u8(None);
                    let particle_bytes_size = field_len - 1;
                    user_key = Some(value::bytes_to_particle(
                        particle_type,
                        &mut conn.buffer,
                        particle_bytes_size,
                    )?);
                }
                _ => conn.buffer.skip(field_len),
            }
        }

        Ok(Key {
            namespace,
            set_name,
            user_key,
            digest,
        })
    }
}
