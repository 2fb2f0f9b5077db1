// THEORY:
// The tracking core is synchronous, single-threaded computation. Applications
// built on tokio still want to push frames from an async capture loop and read
// results from other tasks without ever blocking the runtime.
//
// `TrackingActor` provides that by moving a `TrackingPipeline` onto a dedicated
// blocking thread and talking to it through messages:
// 1.  **Frames In**: frames travel over a bounded mpsc channel, so a capture
//     loop that outpaces the tracker gets back-pressure instead of an
//     ever-growing queue.
// 2.  **Reports Out**: each frame carries a oneshot sender for its own
//     `FrameReport`.
// 3.  **Snapshots Out**: any number of readers can follow the manager's
//     `watch` channel and always observe whole snapshots.
//
// Frames are still processed strictly in submission order, one at a time, so
// the tracked list evolves exactly as it would on a plain loop.

use crate::config::TrackerConfig;
use crate::core_modules::blob_manager::BlobSnapshot;
use crate::error::{Result, TrackingError};
use crate::pipeline::{FrameReport, TrackingPipeline};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const FRAME_QUEUE_DEPTH: usize = 8;

/// An owned frame handed to the actor.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic capture time in seconds.
    pub timestamp: f64,
}

enum ActorMessage {
    Process(Frame, oneshot::Sender<Result<FrameReport>>),
    Shutdown,
}

/// Runs a `TrackingPipeline` on its own thread.
pub struct TrackingActor {
    sender: mpsc::Sender<ActorMessage>,
    snapshots: watch::Receiver<Arc<BlobSnapshot>>,
    worker: JoinHandle<TrackingPipeline>,
}

impl TrackingActor {
    /// Builds a default pipeline from `config` and starts it.
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: TrackerConfig) -> Result<Self> {
        Ok(Self::spawn(TrackingPipeline::new(config)?))
    }

    /// Starts `pipeline` on a blocking worker thread. Listeners and filters
    /// should be registered on the pipeline before it is handed over.
    pub fn spawn(mut pipeline: TrackingPipeline) -> Self {
        let (sender, mut receiver) = mpsc::channel::<ActorMessage>(FRAME_QUEUE_DEPTH);
        let snapshots = pipeline.manager().subscribe();

        let worker = tokio::task::spawn_blocking(move || {
            while let Some(message) = receiver.blocking_recv() {
                match message {
                    ActorMessage::Process(frame, reply) => {
                        let report = pipeline.process_buffer(
                            &frame.data,
                            frame.width,
                            frame.height,
                            frame.timestamp,
                        );
                        // The submitter may have given up waiting.
                        let _ = reply.send(report);
                    }
                    ActorMessage::Shutdown => break,
                }
            }
            debug!("tracking actor stopped after {} frames", pipeline.frames_seen());
            pipeline
        });
        info!("tracking actor started");

        Self {
            sender,
            snapshots,
            worker,
        }
    }

    /// Queues `frame` and waits for its report.
    pub async fn submit(&self, frame: Frame) -> Result<FrameReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ActorMessage::Process(frame, reply_tx))
            .await
            .map_err(|_| TrackingError::ActorClosed)?;
        reply_rx.await.map_err(|_| TrackingError::ActorClosed)?
    }

    /// A receiver that follows every snapshot the actor publishes.
    pub fn snapshots(&self) -> watch::Receiver<Arc<BlobSnapshot>> {
        self.snapshots.clone()
    }

    /// Stops the worker after the frames already queued and hands the
    /// pipeline back.
    pub async fn shutdown(self) -> Result<TrackingPipeline> {
        // If the worker already exited the send fails, which is fine.
        let _ = self.sender.send(ActorMessage::Shutdown).await;
        self.worker.await.map_err(|_| TrackingError::ActorClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::mask::OwnedMask;

    fn frame_with_square(x: u32, timestamp: f64) -> Frame {
        let mut mask = OwnedMask::blank(40, 30);
        mask.fill_rect(x, 10, 5, 5);
        Frame {
            data: mask.as_mask().data().to_vec(),
            width: 40,
            height: 30,
            timestamp,
        }
    }

    #[tokio::test]
    async fn frames_are_tracked_in_submission_order() {
        let actor = TrackingActor::from_config(TrackerConfig::default()).unwrap();
        let mut snapshots = actor.snapshots();

        let first = actor.submit(frame_with_square(5, 0.0)).await.unwrap();
        let second = actor.submit(frame_with_square(7, 0.1)).await.unwrap();
        assert_eq!(first.born, 1);
        assert_eq!(second.matched, 1);
        assert_eq!(second.tracked()[0].id, first.tracked()[0].id);

        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow().timestamp, 0.1);

        let pipeline = actor.shutdown().await.unwrap();
        assert_eq!(pipeline.frames_seen(), 2);
    }

    #[tokio::test]
    async fn malformed_frames_return_an_error() {
        let actor = TrackingActor::from_config(TrackerConfig::default()).unwrap();
        let frame = Frame {
            data: vec![0; 3],
            width: 4,
            height: 4,
            timestamp: 0.0,
        };
        let err = actor.submit(frame).await.unwrap_err();
        assert!(matches!(err, TrackingError::Label(_)));
        actor.shutdown().await.unwrap();
    }
}
