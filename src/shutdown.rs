use tokio::sync::broadcast;

/// Listens for the shutdown signal.
///
/// Shutdown is signalled by dropping the paired `broadcast::Sender`; only a
/// single value is ever observed. Once received, `is_shutdown` stays true.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received.
    is_shutdown: bool,
    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Clone for Shutdown {
    /// Returns a new listener subscribed to the same sender.
    fn clone(&self) -> Self {
        Shutdown {
            is_shutdown: self.is_shutdown,
            notify: self.notify.resubscribe(),
        }
    }
}

impl Shutdown {
    /// Returns a new Shutdown backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            is_shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&mut self) -> bool {
        if !self.is_shutdown {
            // pick up a signal that arrived while nobody was awaiting `recv`
            if let Err(broadcast::error::TryRecvError::Closed) = self.notify.try_recv() {
                self.is_shutdown = true;
            }
        }
        self.is_shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        if self.is_shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        self.is_shutdown = true;
    }
}
