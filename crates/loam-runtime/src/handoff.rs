//! Worker-to-presentation mesh handoff.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded, unbounded};
use loam_mesh::{ChunkError, MeshPackage};

/// Constructors for the many-producer, single-consumer package channel.
pub struct MeshHandoffChannel;

impl MeshHandoffChannel {
    pub fn unbounded() -> (MeshPublisher, MeshReceiver) {
        let (tx, rx) = unbounded();
        (MeshPublisher { tx }, MeshReceiver { rx })
    }

    /// A full bounded channel makes `publish` fail with `ChannelOverflow`.
    pub fn bounded(capacity: usize) -> (MeshPublisher, MeshReceiver) {
        let (tx, rx) = bounded(capacity.max(1));
        (MeshPublisher { tx }, MeshReceiver { rx })
    }

    /// `0` means unbounded.
    pub fn with_capacity(capacity: usize) -> (MeshPublisher, MeshReceiver) {
        if capacity == 0 {
            Self::unbounded()
        } else {
            Self::bounded(capacity)
        }
    }
}

/// Producer side; one clone per worker.
#[derive(Clone, Debug)]
pub struct MeshPublisher {
    tx: Sender<MeshPackage>,
}

impl MeshPublisher {
    /// Never blocks. The package is moved into the channel on success.
    pub fn publish(&self, package: MeshPackage) -> Result<(), ChunkError> {
        match self.tx.try_send(package) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ChunkError::ChannelOverflow),
            Err(TrySendError::Disconnected(_)) => Err(ChunkError::ChannelClosed),
        }
    }
}

/// Consumer side, owned by the presentation thread.
#[derive(Debug)]
pub struct MeshReceiver {
    rx: Receiver<MeshPackage>,
}

impl MeshReceiver {
    /// Never blocks.
    pub fn try_take(&self) -> Option<MeshPackage> {
        match self.rx.try_recv() {
            Ok(pkg) => Some(pkg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Takes up to `limit` packages that are ready right now.
    pub fn drain(&self, limit: usize) -> Vec<MeshPackage> {
        self.rx.try_iter().take(limit).collect()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
