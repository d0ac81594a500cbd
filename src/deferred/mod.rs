//! Deferred action mailbox.
//!
//! Any part of the application (including background threads) may enqueue a
//! callback; the layout pass drains the mailbox once its structural work is
//! done, so an action that triggers another layout never re-enters the pass.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::error::{LayoutError, Result};

/// Zero-argument, fallible callback run after a layout pass.
pub type DeferredAction = Box<dyn FnOnce() -> Result<()> + Send>;

/// Cloneable producer handle for the deferred mailbox.
#[derive(Clone)]
pub struct DeferredSender {
    sender: Sender<DeferredAction>,
}

impl DeferredSender {
    pub fn enqueue<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.sender
            .send(Box::new(action))
            .map_err(|_| LayoutError::Deferred("deferred queue closed".to_string()))
    }
}

/// Single-consumer end of the mailbox, owned by the layout engine.
pub struct DeferredQueue {
    sender: Sender<DeferredAction>,
    receiver: Receiver<DeferredAction>,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> DeferredSender {
        DeferredSender {
            sender: self.sender.clone(),
        }
    }

    pub fn enqueue<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.sender().enqueue(action)
    }

    /// Run every queued action in FIFO order without waiting for new ones.
    ///
    /// Stops at the first failure and returns it; actions that already ran
    /// stay applied. Returns the number of actions executed.
    pub fn drain(&self) -> Result<usize> {
        let mut executed = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(action) => {
                    action()?;
                    executed += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(executed),
            }
        }
    }
}
