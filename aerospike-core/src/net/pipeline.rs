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

//! A pipelined connection multiplexer.
//!
//! Unlike `ConnectionPool`, which hands out one exclusive `Connection` per
//! in-flight command, a `PipelineConnection` lets several commands share one
//! TCP socket: a writer enqueues its request and moves on without waiting for
//! the reply, and responses are drained strictly in the order their requests
//! were written. The server itself guarantees in-order responses per
//! connection, so the only thing the client has to get right is not letting
//! two commands race to read the socket out of turn.
//!
//! `ReaderQueue` is the ticket-ordered scheduler that makes this safe; it has
//! no socket of its own so it can be exercised directly in tests.

use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::lock::Mutex;

use crate::errors::{Error, Result};
use crate::net::{Connection, Host};
use crate::policy::ClientPolicy;
use crate::result_code::ResultCode;

/// Result codes (and error categories) that poison an entire pipelined
/// connection rather than just the command that triggered them. The
/// connection is cancelled - every other reader queued behind it fails too -
/// instead of being handed back to the pool.
pub(crate) fn is_fatal(err: &Error) -> bool {
    matches!(
        err,
        Error::ServerError(ResultCode::QueryAborted | ResultCode::ScanAbort)
            | Error::ClientError(_)
            | Error::Connection(_)
            | Error::InvalidNode(_)
    ) || matches!(err, Error::ServerError(rc) if *rc == not_authenticated())
}

const fn not_authenticated() -> ResultCode {
    ResultCode::NotAuthenticated
}

/// A ticket handed out by `ReaderQueue::enqueue`. Redeem it with
/// `ReaderQueue::wait_turn` before touching the socket, and retire it with
/// `ReaderQueue::complete` once the response has been consumed.
#[derive(Debug)]
pub(crate) struct ReadTicket(u64);

/// FIFO scheduler for a pipelined connection's reader side. Socket-free by
/// design so the ordering and cancellation invariants can be tested without a
/// live connection.
#[derive(Debug)]
pub(crate) struct ReaderQueue {
    next_ticket: AtomicU64,
    now_serving: AtomicU64,
    waiters: Mutex<HashMap<u64, oneshot::Sender<()>>>,
    cancelled: Mutex<Option<String>>,
}

impl Default for ReaderQueue {
    fn default() -> Self {
        ReaderQueue {
            next_ticket: AtomicU64::new(0),
            now_serving: AtomicU64::new(0),
            waiters: Mutex::new(HashMap::new()),
            cancelled: Mutex::new(None),
        }
    }
}

impl ReaderQueue {
    /// Reserve the next FIFO position. Call this at write time, in the order
    /// requests are written to the socket.
    pub(crate) fn enqueue(&self) -> ReadTicket {
        ReadTicket(self.next_ticket.fetch_add(1, Ordering::AcqRel))
    }

    /// Blocks until it is this ticket's turn to read from the socket, or
    /// returns immediately with the cancellation error if the connection has
    /// been quarantined.
    pub(crate) async fn wait_turn(&self, ticket: &ReadTicket) -> Result<()> {
        loop {
            if let Some(reason) = self.cancelled.lock().await.clone() {
                return Err(Error::Connection(reason));
            }
            if self.now_serving.load(Ordering::Acquire) == ticket.0 {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            {
                let mut waiters = self.waiters.lock().await;
                // Re-check under the lock: the head may have advanced, or the
                // connection may have been cancelled, between the checks above
                // and taking the lock.
                if let Some(reason) = self.cancelled.lock().await.clone() {
                    return Err(Error::Connection(reason));
                }
                if self.now_serving.load(Ordering::Acquire) == ticket.0 {
                    return Ok(());
                }
                waiters.insert(ticket.0, tx);
            }
            let _ = rx.await;
        }
    }

    /// Retires the current head of the queue, waking whichever ticket is next.
    pub(crate) async fn complete(&self, ticket: ReadTicket) {
        self.now_serving.store(ticket.0 + 1, Ordering::Release);
        let next = self.waiters.lock().await.remove(&(ticket.0 + 1));
        if let Some(tx) = next {
            let _ = tx.send(());
        }
    }

    /// Quarantines the connection: every ticket currently waiting (and every
    /// one that enqueues from now on) observes the same cancellation error
    /// exactly once, regardless of how far behind the head of the queue it is.
    pub(crate) async fn cancel(&self, reason: String) {
        *self.cancelled.lock().await = Some(reason);
        let mut waiters = self.waiters.lock().await;
        for (_, tx) in waiters.drain() {
            let _ = tx.send(());
        }
    }

    pub(crate) async fn is_cancelled(&self) -> bool {
        self.cancelled.lock().await.is_some()
    }
}

/// A TCP connection multiplexing several in-flight batch-read commands.
///
/// Invariants: exactly one writer proceeds at a time (`write_lock`); readers
/// drain strictly in the order their requests were written (`readers`);
/// `canceling` is set the instant a fatal condition is discovered so a
/// concurrent pool acquisition does not hand this connection out, and
/// `canceled` is set once every queued reader has been failed.
pub struct PipelineConnection {
    conn: Mutex<Connection>,
    write_lock: Mutex<()>,
    readers: ReaderQueue,
    canceling: AtomicBool,
    canceled: AtomicBool,
    in_pool: AtomicBool,
}

impl PipelineConnection {
    fn new(conn: Connection) -> Self {
        PipelineConnection {
            conn: Mutex::new(conn),
            write_lock: Mutex::new(()),
            readers: ReaderQueue::default(),
            canceling: AtomicBool::new(false),
            canceled: AtomicBool::new(false),
            in_pool: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_canceling(&self) -> bool {
        self.canceling.load(Ordering::Acquire)
    }

    pub(crate) fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Writes one request and hands the connection back to the pool-eligible
    /// state, without waiting for its response. Returns a ticket to redeem
    /// via `read_response`.
    pub(crate) async fn write_request(
        &self,
        encode: impl FnOnce(&mut Connection) -> Result<()>,
    ) -> Result<ReadTicket> {
        if self.is_canceling() || self.is_canceled() {
            bail!(Error::Connection(
                "pipelined connection is being cancelled".to_string()
            ));
        }
        let _write_guard = self.write_lock.lock().await;
        let ticket = self.readers.enqueue();
        let mut conn = self.conn.lock().await;
        encode(&mut conn)?;
        if let Err(err) = conn.flush().await {
            drop(conn);
            self.cancel(Error::Connection(err.to_string())).await;
            return Err(err);
        }
        drop(conn);
        // The write completed; the socket's read half is free to serve
        // earlier-queued responses while later writers keep pipelining.
        self.in_pool.store(true, Ordering::Release);
        Ok(ticket)
    }

    /// Parses the response belonging to `ticket`, blocking until it is this
    /// ticket's turn at the head of the FIFO reader queue.
    pub(crate) async fn read_response<T>(
        &self,
        ticket: ReadTicket,
        parse: impl for<'c> FnOnce(&'c mut Connection) -> futures::future::BoxFuture<'c, Result<T>>,
    ) -> Result<T> {
        self.readers.wait_turn(&ticket).await?;
        let mut conn = self.conn.lock().await;
        let result = parse(&mut conn).await;
        drop(conn);
        if let Err(ref err) = result {
            if is_fatal(err) {
                self.readers.complete(ticket).await;
                self.cancel(Error::Connection(format!(
                    "pipelined connection cancelled: {}",
                    err
                )))
                .await;
                return result;
            }
        }
        self.readers.complete(ticket).await;
        result
    }

    /// Cancels the entire connection: every reader already queued (and every
    /// new write attempt from this point on) fails with `reason` exactly
    /// once. The `canceling`/`canceled` pair keeps a concurrent pool
    /// acquisition from handing out a connection mid-teardown.
    async fn cancel(&self, reason: Error) {
        if self.canceling.swap(true, Ordering::AcqRel) {
            return;
        }
        self.readers.cancel(reason.to_string()).await;
        self.canceled.store(true, Ordering::Release);
    }

    async fn close(&self) {
        self.conn.lock().await.close().await;
    }
}

/// One sub-queue of a `PipelinePool`: connections for a single host, shared
/// across an arbitrary number of concurrently-submitted commands.
struct PipelineQueue {
    connections: Mutex<VecDeque<Arc<PipelineConnection>>>,
    capacity: usize,
    host: Host,
    policy: ClientPolicy,
    open: AtomicUsize,
}

impl PipelineQueue {
    fn new(capacity: usize, host: Host, policy: ClientPolicy) -> Self {
        PipelineQueue {
            connections: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            host,
            policy,
            open: AtomicUsize::new(0),
        }
    }

    /// Prefers opening a brand-new connection until the pool's capacity is
    /// reached; only then does it hand out an existing, validated one.
    async fn acquire(&self) -> Result<Arc<PipelineConnection>> {
        if self.open.load(Ordering::Relaxed) < self.capacity {
            self.open.fetch_add(1, Ordering::Relaxed);
            match Connection::new(&self.host.address(), &self.policy).await {
                Ok(conn) => return Ok(Arc::new(PipelineConnection::new(conn))),
                Err(err) => {
                    self.open.fetch_sub(1, Ordering::Relaxed);
                    bail!(err);
                }
            }
        }

        loop {
            let candidate = self.connections.lock().await.pop_front();
            match candidate {
                None => bail!(Error::NoMoreConnections),
                Some(pc) => {
                    if pc.is_canceling() || pc.is_canceled() {
                        // Quarantined: drop it on the floor rather than serve it.
                        self.open.fetch_sub(1, Ordering::Relaxed);
                        continue;
                    }
                    return Ok(pc);
                }
            }
        }
    }

    async fn release(&self, conn: Arc<PipelineConnection>) {
        if conn.is_canceled() {
            conn.close().await;
            self.open.fetch_sub(1, Ordering::Relaxed);
            return;
        }
        if conn.is_canceling() {
            // Teardown is in flight; releasing now would race the cancellation
            // cascade. The connection completes its own cleanup and is never
            // returned to the idle list.
            return;
        }
        self.connections.lock().await.push_back(conn);
    }
}

/// Per-node pool of pipelined connections, mirroring `ConnectionPool`'s
/// acquisition policy but handing out connections that may already be
/// multiplexing other commands.
pub struct PipelinePool {
    queue: PipelineQueue,
}

impl PipelinePool {
    /// Creates a pool capped at `policy.connection_pool_size_per_node`
    /// pipelined connections for `host`.
    pub fn new(host: Host, policy: ClientPolicy) -> Self {
        let capacity = policy.connection_pool_size_per_node;
        PipelinePool {
            queue: PipelineQueue::new(capacity, host, policy),
        }
    }

    /// Borrows a pipelined connection, opening a new one while the pool has
    /// spare capacity.
    pub async fn acquire(&self) -> Result<PooledPipelineConnection<'_>> {
        let conn = self.queue.acquire().await?;
        Ok(PooledPipelineConnection {
            pool: &self.queue,
            conn: Some(conn),
        })
    }

    /// Closes every idle connection currently sitting in the pool.
    pub async fn close(&self) {
        let mut connections = self.queue.connections.lock().await;
        for conn in connections.drain(..) {
            conn.close().await;
        }
    }
}

/// A borrowed pipelined connection; returned to its pool on drop unless it
/// was cancelled, in which case it is simply closed.
pub struct PooledPipelineConnection<'a> {
    pool: &'a PipelineQueue,
    conn: Option<Arc<PipelineConnection>>,
}

impl<'a> Deref for PooledPipelineConnection<'a> {
    type Target = Arc<PipelineConnection>;

    fn deref(&self) -> &Arc<PipelineConnection> {
        self.conn.as_ref().unwrap()
    }
}

impl<'a> DerefMut for PooledPipelineConnection<'a> {
    fn deref_mut(&mut self) -> &mut Arc<PipelineConnection> {
        self.conn.as_mut().unwrap()
    }
}

impl<'a> Drop for PooledPipelineConnection<'a> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            futures::executor::block_on(self.pool.release(conn));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReaderQueue;
    use futures::executor::block_on;
    use futures::future::join_all;
    use std::sync::{Arc, Mutex};

    #[test]
    fn fifo_completion_order() {
        block_on(async {
            let queue = Arc::new(ReaderQueue::default());
            let order = Arc::new(Mutex::new(Vec::new()));

            let mut tasks = Vec::new();
            let tickets: Vec<_> = (0..5).map(|_| queue.enqueue()).collect();
            for (i, ticket) in tickets.into_iter().enumerate() {
                let queue = queue.clone();
                let order = order.clone();
                tasks.push(async move {
                    queue.wait_turn(&ticket).await.unwrap();
                    order.lock().unwrap().push(i);
                    queue.complete(ticket).await;
                });
            }
            // Drive them in reverse submission order; the queue must still
            // serialize completion in ticket (= submission) order.
            tasks.reverse();
            join_all(tasks).await;

            assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        });
    }

    #[test]
    fn cancellation_completes_every_queued_reader() {
        block_on(async {
            let queue = ReaderQueue::default();
            let head = queue.enqueue();
            let behind: Vec<_> = (0..4).map(|_| queue.enqueue()).collect();

            queue.cancel("fatal condition".to_string()).await;

            // The head never got its turn before cancellation; every ticket,
            // head or not, must observe the cancellation exactly once.
            assert!(queue.wait_turn(&head).await.is_err());
            for ticket in behind {
                assert!(queue.wait_turn(&ticket).await.is_err());
            }
        });
    }
}
