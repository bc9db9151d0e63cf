//! Asynchronous compile-job queue binding
//!
//! Producers (the web tier reacting to webhooks or add-repository events)
//! and consumers (worker processes) share only the message shape and the
//! queue name. The transport itself is a trait so deployments can bind a
//! real broker while tests and the in-process worker use
//! [`MemoryTransport`].

use crate::Result;
use crate::config::Repository;
use crate::constants::queue::COMPILE_QUEUE;
use crate::store::RepositoryStore;
use anyhow::bail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One message taken off a queue, awaiting acknowledgement
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: u64,
    pub queue: String,
    pub payload: Vec<u8>,
}

/// Durable-queue transport seam
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<()>;

    /// Next message on the queue. Blocks until one is available; resolves
    /// `None` once the transport is closed and the backlog drained.
    async fn receive(&self, queue: &str) -> Result<Option<Delivery>>;

    /// Acknowledge a received message so it is never redelivered
    async fn ack(&self, delivery: &Delivery) -> Result<()>;
}

#[derive(Default)]
struct TransportState {
    queues: HashMap<String, VecDeque<Delivery>>,
    in_flight: HashMap<u64, Delivery>,
    next_id: u64,
    closed: bool,
}

/// In-process transport: per-queue FIFO with in-flight tracking
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<TransportState>,
    notify: Notify,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop accepting messages; consumers finish the backlog and then see
    /// the end of the stream
    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
        self.notify.notify_waiters();
    }

    /// Messages waiting on `queue`, not counting in-flight deliveries
    pub fn pending(&self, queue: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .queues
            .get(queue)
            .map_or(0, |q| q.len())
    }

    /// Delivered but not yet acknowledged messages
    pub fn in_flight_count(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }
}

#[async_trait]
impl QueueTransport for MemoryTransport {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                bail!("Transport is closed");
            }
            state.next_id += 1;
            let delivery = Delivery {
                id: state.next_id,
                queue: queue.to_string(),
                payload,
            };
            state
                .queues
                .entry(queue.to_string())
                .or_default()
                .push_back(delivery);
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(&self, queue: &str) -> Result<Option<Delivery>> {
        let mut notified = std::pin::pin!(self.notify.notified());
        loop {
            // Register interest before checking state so a publish between
            // the check and the await cannot be missed
            notified.as_mut().enable();
            {
                let mut state = self.state.lock().unwrap();
                if let Some(delivery) =
                    state.queues.get_mut(queue).and_then(|q| q.pop_front())
                {
                    state.in_flight.insert(delivery.id, delivery.clone());
                    return Ok(Some(delivery));
                }
                if state.closed {
                    return Ok(None);
                }
            }
            notified.as_mut().await;
            notified.set(self.notify.notified());
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.in_flight.remove(&delivery.id).is_none() {
            bail!("Message {} was not in flight", delivery.id);
        }
        Ok(())
    }
}

/// Wire payload of a compile job.
///
/// Unknown fields are ignored on parse so producers and consumers running
/// different versions stay compatible; additions to this shape must remain
/// optional.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompileJob {
    #[serde(rename = "repositoryID")]
    pub repository_id: String,
}

/// Enqueue a compile job for `repository_id`
pub async fn enqueue_compile_job(
    transport: &dyn QueueTransport,
    repository_id: &str,
) -> Result<()> {
    let payload = serde_json::to_vec(&CompileJob {
        repository_id: repository_id.to_string(),
    })?;
    transport.publish(COMPILE_QUEUE, payload).await
}

/// Single-use acknowledgement for one delivery
pub struct Ack {
    transport: Arc<dyn QueueTransport>,
    delivery: Delivery,
}

impl Ack {
    /// Acknowledge the message. Consumes the handle so it can only fire
    /// once.
    pub async fn ack(self) -> Result<()> {
        self.transport.ack(&self.delivery).await
    }
}

/// A compile job resolved to its repository, ready for processing
pub struct CompileJobContext {
    pub repository: Repository,
    /// Must be fired exactly once, after the compile + reconcile sequence
    /// finishes - success or failure. Jobs are never redelivered.
    pub ack: Ack,
}

/// Prefetch-1 consumer of the compile-job queue
pub struct CompileJobConsumer {
    transport: Arc<dyn QueueTransport>,
    repositories: Arc<dyn RepositoryStore>,
}

impl CompileJobConsumer {
    pub fn new(transport: Arc<dyn QueueTransport>, repositories: Arc<dyn RepositoryStore>) -> Self {
        Self {
            transport,
            repositories,
        }
    }

    /// Consume compile jobs one at a time until the transport closes.
    ///
    /// Messages that can never succeed - unparsable payloads, empty
    /// repository ids, repositories that no longer exist - are acknowledged
    /// and dropped immediately so they are not redelivered. The next message
    /// is not fetched until the handler for the current one returns.
    pub async fn run<F, Fut>(&self, handler: F) -> Result<()>
    where
        F: Fn(CompileJobContext) -> Fut,
        Fut: Future<Output = ()>,
    {
        while let Some(delivery) = self.transport.receive(COMPILE_QUEUE).await? {
            let job: CompileJob = match serde_json::from_slice(&delivery.payload) {
                Ok(job) => job,
                Err(_) => {
                    self.transport.ack(&delivery).await?;
                    continue;
                }
            };
            if job.repository_id.is_empty() {
                self.transport.ack(&delivery).await?;
                continue;
            }

            let Some(repository) = self.repositories.find_repository(&job.repository_id).await?
            else {
                self.transport.ack(&delivery).await?;
                continue;
            };

            let ack = Ack {
                transport: Arc::clone(&self.transport),
                delivery,
            };
            handler(CompileJobContext { repository, ack }).await;
        }
        Ok(())
    }
}
