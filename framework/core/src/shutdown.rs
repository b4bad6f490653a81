use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;

/// Signals the end of a run, or of a single scenario's grace period, to everything listening.
///
/// The signal is latched. A listener created after [ShutdownHandle::shutdown] was called still
/// observes it, which matters for workers that are spawned while a scenario is winding down.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown(&self) {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.sender.send(()).is_err() {
            // Nobody subscribed yet, the latched flag covers them.
            log::trace!("Shutdown signalled with no active listeners");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn new_listener(&self) -> DelegatedShutdownListener {
        DelegatedShutdownListener::new(self.sender.subscribe(), self.triggered.clone())
    }
}

#[derive(Clone, Debug)]
pub struct DelegatedShutdownListener {
    receiver: Arc<Mutex<Receiver<()>>>,
    triggered: Arc<AtomicBool>,
}

impl DelegatedShutdownListener {
    pub(crate) fn new(receiver: Receiver<()>, triggered: Arc<AtomicBool>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            triggered,
        }
    }

    /// Point in time check for the shutdown signal. Never blocks.
    pub fn should_shutdown(&mut self) -> bool {
        if self.triggered.load(Ordering::SeqCst) {
            return true;
        }

        match self.receiver.try_lock() {
            Ok(mut guard) => match guard.try_recv() {
                Ok(_) | Err(TryRecvError::Closed) => true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Lagged(_)) => false,
            },
            Err(_) => false,
        }
    }

    /// Wait until the shutdown signal is received.
    ///
    /// Safe to race with other futures in a `tokio::select!` so that in-flight work can be
    /// abandoned when the signal arrives.
    pub async fn wait_for_shutdown(&mut self) {
        if self.triggered.load(Ordering::SeqCst) {
            return;
        }

        let mut guard = self.receiver.lock().await;
        match guard.recv().await {
            Ok(()) | Err(RecvError::Closed) | Err(RecvError::Lagged(_)) => {}
        }
    }
}
