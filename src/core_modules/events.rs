// THEORY:
// Listeners are how the outside world hears about object lifecycles without
// polling. The manager calls them synchronously, on the frame-processing
// thread, in registration order.
//
// That makes a slow listener a slow pipeline. `ChannelListener` is the escape
// hatch: it turns each callback into a message on an unbounded tokio channel
// and returns immediately, so the consumer can run on any task or thread.

use crate::core_modules::correlator::TrackedBlob;
use tokio::sync::mpsc;

/// Receives lifecycle notifications from a `BlobManager`.
///
/// Every method has an empty default so implementors only override what
/// they care about.
pub trait BlobListener: Send + Sync {
    /// An object has existed long enough to be accepted.
    fn new_blob_detected(&self, _blob: &TrackedBlob) {}

    /// An object exceeded the maximum missing time and was dropped.
    fn blob_lost(&self, _blob: &TrackedBlob) {}

    /// A manager update finished. Fires once per update.
    fn blobs_updated(&self) {}
}

/// Handle returned by `BlobManager::add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// A lifecycle notification as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobEvent {
    NewBlobDetected(TrackedBlob),
    BlobLost(TrackedBlob),
    BlobsUpdated,
}

/// Forwards every notification onto an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<BlobEvent>,
}

impl ChannelListener {
    /// Creates a listener and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BlobEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: BlobEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.sender.send(event);
    }
}

impl BlobListener for ChannelListener {
    fn new_blob_detected(&self, blob: &TrackedBlob) {
        self.forward(BlobEvent::NewBlobDetected(blob.clone()));
    }

    fn blob_lost(&self, blob: &TrackedBlob) {
        self.forward(BlobEvent::BlobLost(blob.clone()));
    }

    fn blobs_updated(&self) {
        self.forward(BlobEvent::BlobsUpdated);
    }
}
