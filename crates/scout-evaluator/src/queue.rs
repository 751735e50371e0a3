//! Bounded work queue with a drain barrier.

use crate::error::{EvalError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex, Notify};

/// Multi-consumer bounded queue.
///
/// `put` suspends while the queue is full. Every taken item must be
/// acknowledged with [`WorkQueue::task_done`] (or through an [`Ack`] guard);
/// [`WorkQueue::join`] resolves once every item put has been acknowledged.
pub(crate) struct WorkQueue<T> {
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
    unfinished: AtomicUsize,
    drained: Notify,
}

impl<T> WorkQueue<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
            unfinished: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    pub(crate) async fn put(&self, item: T) -> Result<()> {
        let permit = self
            .sender
            .reserve()
            .await
            .map_err(|_| EvalError::QueueClosed)?;
        self.unfinished.fetch_add(1, Ordering::SeqCst);
        permit.send(item);
        Ok(())
    }

    /// Next item, taken by exactly one consumer.
    pub(crate) async fn take(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    pub(crate) fn task_done(&self) {
        if self.unfinished.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    pub(crate) fn unfinished(&self) -> usize {
        self.unfinished.load(Ordering::SeqCst)
    }

    pub(crate) async fn join(&self) {
        loop {
            // Register before checking so a concurrent task_done is not lost
            let notified = self.drained.notified();
            if self.unfinished() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Acknowledges one item when dropped, including on panic.
pub(crate) struct Ack<'a, T>(pub(crate) &'a WorkQueue<T>);

impl<T> Drop for Ack<'_, T> {
    fn drop(&mut self) {
        self.0.task_done();
    }
}
