// MIT License - Copyright (c) 2026 Peter Wright
// Change notification bus

use tokio::sync::watch;

/// Producer side of the change bus.
///
/// Carries no payload, only a generation counter: consumers re-read the
/// [`StateStore`](crate::state::StateStore) after waking. `notify()` is
/// synchronous and succeeds whether or not anyone is listening, so the
/// poll loop can never stall on a slow or absent consumer. A consumer
/// that misses several generations wakes once and sees only the latest.
#[derive(Debug)]
pub struct ChangeNotifier {
    tx: watch::Sender<u64>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Open an independent notification line for one consumer class.
    ///
    /// Must be called before the first `notify()` a consumer cares
    /// about; the store-update-then-notify ordering in the poll loop
    /// guarantees a subscriber woken by generation N reads a snapshot at
    /// least as new as the one written for N.
    pub fn subscribe(&self) -> ChangeListener {
        ChangeListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Signal that a new snapshot is available. Never blocks.
    pub fn notify(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }

    /// The generation of the most recent signal.
    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of the change bus.
///
/// Cloning opens another line with its own pending-change slot (each
/// browser stream gets one, so concurrent streams do not steal each
/// other's wake-ups).
#[derive(Debug, Clone)]
pub struct ChangeListener {
    rx: watch::Receiver<u64>,
}

impl ChangeListener {
    /// Wait until a new snapshot has been published since this listener
    /// last woke. Returns the generation observed, or `None` once the
    /// notifier is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// The raw watch receiver, for adapters that need a `Stream`.
    pub fn into_receiver(self) -> watch::Receiver<u64> {
        self.rx
    }
}
