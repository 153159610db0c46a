//! Multi-producer, single-consumer entry queue
//!
//! A `flume` channel carries entries from producers to the processor.
//! Producers never touch the file system. Closing drops the queue's sender,
//! so the consumer sees disconnection once everything queued has been read.

use crate::{LogEntry, OverflowPolicy};
use flume::{Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Result of offering an entry to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Push {
    /// Queued
    Accepted,
    /// Queued after discarding the oldest entry
    Displaced,
    /// Discarded because the queue stayed full
    Dropped,
    /// Discarded because the queue no longer accepts entries
    Closed,
}

#[derive(Debug)]
pub(crate) struct LogQueue {
    sender: RwLock<Option<Sender<LogEntry>>>,
    receiver: Receiver<LogEntry>,
    policy: OverflowPolicy,
}

impl LogQueue {
    /// A queue holding at most `capacity` entries, `0` for unbounded.
    pub(crate) fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let (sender, receiver) = if capacity == 0 {
            flume::unbounded()
        } else {
            flume::bounded(capacity)
        };

        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            policy,
        }
    }

    fn sender(&self) -> Option<Sender<LogEntry>> {
        self.sender.read().clone()
    }

    /// Offer an entry from synchronous code.
    ///
    /// Under [`OverflowPolicy::Block`] the calling thread waits for room,
    /// except on a current-thread runtime, where waiting would starve the
    /// consumer and a full queue drops the entry instead.
    pub(crate) fn push(&self, entry: LogEntry) -> Push {
        let Some(sender) = self.sender() else {
            return Push::Closed;
        };

        match self.policy {
            OverflowPolicy::DropNewest => match sender.try_send(entry) {
                Ok(()) => Push::Accepted,
                Err(TrySendError::Full(_)) => Push::Dropped,
                Err(TrySendError::Disconnected(_)) => Push::Closed,
            },
            OverflowPolicy::DropOldest => self.displace(&sender, entry),
            OverflowPolicy::Block { timeout_ms } => {
                let timeout = Duration::from_millis(timeout_ms);
                match Handle::try_current().map(|handle| handle.runtime_flavor()) {
                    Ok(RuntimeFlavor::CurrentThread) => match sender.try_send(entry) {
                        Ok(()) => Push::Accepted,
                        Err(TrySendError::Full(_)) => Push::Dropped,
                        Err(TrySendError::Disconnected(_)) => Push::Closed,
                    },
                    Ok(_) => tokio::task::block_in_place(|| send_timeout(&sender, entry, timeout)),
                    Err(_) => send_timeout(&sender, entry, timeout),
                }
            }
        }
    }

    /// Offer an entry from async code.
    ///
    /// Under [`OverflowPolicy::Block`] the calling task is suspended until
    /// there is room or the timeout elapses; other policies never wait.
    pub(crate) async fn push_async(&self, entry: LogEntry) -> Push {
        let OverflowPolicy::Block { timeout_ms } = self.policy else {
            return self.push(entry);
        };
        let Some(sender) = self.sender() else {
            return Push::Closed;
        };

        let timeout = Duration::from_millis(timeout_ms);
        match tokio::time::timeout(timeout, sender.send_async(entry)).await {
            Ok(Ok(())) => Push::Accepted,
            Ok(Err(_)) => Push::Closed,
            Err(_) => Push::Dropped,
        }
    }

    fn displace(&self, sender: &Sender<LogEntry>, mut entry: LogEntry) -> Push {
        let mut outcome = Push::Accepted;
        loop {
            match sender.try_send(entry) {
                Ok(()) => return outcome,
                Err(TrySendError::Full(rejected)) => {
                    entry = rejected;
                    if self.receiver.try_recv().is_ok() {
                        outcome = Push::Displaced;
                    }
                }
                Err(TrySendError::Disconnected(_)) => return Push::Closed,
            }
        }
    }

    /// Wait for the next entry; `None` once the queue is closed and empty.
    pub(crate) async fn pop(&self) -> Option<LogEntry> {
        self.receiver.recv_async().await.ok()
    }

    /// Stop accepting entries. Queued entries remain poppable.
    pub(crate) fn close(&self) {
        self.sender.write().take();
    }

    /// Close the queue and discard whatever is left, returning how many
    /// entries were discarded.
    pub(crate) fn abandon(&self) -> usize {
        self.close();
        self.receiver.drain().count()
    }

    pub(crate) fn len(&self) -> usize {
        self.receiver.len()
    }
}

fn send_timeout(sender: &Sender<LogEntry>, entry: LogEntry, timeout: Duration) -> Push {
    match sender.send_timeout(entry, timeout) {
        Ok(()) => Push::Accepted,
        Err(SendTimeoutError::Timeout(_)) => Push::Dropped,
        Err(SendTimeoutError::Disconnected(_)) => Push::Closed,
    }
}
