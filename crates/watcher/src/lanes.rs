//! Per-profile execution lanes
//!
//! Every profile gets one worker task with its own bounded queue. Work for a
//! profile runs strictly in arrival order; different profiles run in
//! parallel. When a debounce window is configured, a change request waits
//! out the window and absorbs any change requests queued behind it.
//!
//! A cascade closes its profile's lane. The worker drains what is already
//! queued and exits; a lane started later for the same path waits for it
//! first, so ordering holds across the handover.

use crate::pipeline::{ProfileOp, ProfilePipeline};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

enum LaneMsg {
    Op(ProfileOp),
    Barrier(oneshot::Sender<()>),
}

struct Lane {
    tx: mpsc::Sender<LaneMsg>,
    handle: JoinHandle<()>,
    /// Closed when the worker exits
    done: watch::Receiver<()>,
}

/// Map of profile path to its worker
pub struct Lanes {
    lanes: DashMap<PathBuf, Lane>,
    /// Closed lanes whose workers may still be draining
    retiring: DashMap<PathBuf, watch::Receiver<()>>,
    pipeline: Arc<ProfilePipeline>,
    capacity: usize,
    debounce: Duration,
}

impl Lanes {
    pub fn new(pipeline: Arc<ProfilePipeline>) -> Self {
        let config = pipeline.config();
        Self {
            lanes: DashMap::new(),
            retiring: DashMap::new(),
            capacity: config.event_buffer.max(1),
            debounce: config.debounce(),
            pipeline,
        }
    }

    /// Queue `op` on its profile's lane, starting the lane if needed
    pub async fn submit(&self, op: ProfileOp) {
        let key = op.profile().path().to_path_buf();
        let closes_lane = matches!(op, ProfileOp::Cascade(_));
        let mut msg = LaneMsg::Op(op);

        // One retry: a lane whose worker died is replaced
        for _ in 0..2 {
            let tx = self.sender(&key);
            match tx.send(msg).await {
                Ok(()) => {
                    if closes_lane {
                        self.retire(&key);
                    }
                    return;
                }
                Err(mpsc::error::SendError(returned)) => {
                    error!(profile = %key.display(), "profile lane stopped, restarting");
                    self.lanes.remove(&key);
                    msg = returned;
                }
            }
        }

        error!(profile = %key.display(), "dropping profile operation");
    }

    /// Wait until every lane has finished the work queued so far
    pub async fn settle(&self) {
        let senders: Vec<_> = self.lanes.iter().map(|lane| lane.tx.clone()).collect();

        let mut waits = Vec::with_capacity(senders.len());
        for tx in senders {
            let (done_tx, done_rx) = oneshot::channel();
            if tx.send(LaneMsg::Barrier(done_tx)).await.is_ok() {
                waits.push(done_rx);
            }
        }

        for done in waits {
            let _ = done.await;
        }

        self.drain_retiring().await;
    }

    /// Number of profiles with an open lane
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Close every lane and wait for queued work to finish
    pub async fn shutdown(self) {
        let keys: Vec<_> = self.lanes.iter().map(|lane| lane.key().clone()).collect();
        for key in keys {
            let Some((_, lane)) = self.lanes.remove(&key) else {
                continue;
            };
            drop(lane.tx);
            if let Err(e) = lane.handle.await {
                error!(error = %e, "profile lane panicked");
            }
        }

        self.drain_retiring().await;
    }

    fn sender(&self, key: &Path) -> mpsc::Sender<LaneMsg> {
        self.lanes
            .entry(key.to_path_buf())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::channel(self.capacity);
                let (done_tx, done) = watch::channel(());
                let predecessor = self.retiring.remove(key).map(|(_, done)| done);
                debug!(profile = %key.display(), "starting profile lane");
                let handle = tokio::spawn(run_lane(
                    rx,
                    Arc::clone(&self.pipeline),
                    self.debounce,
                    predecessor,
                    done_tx,
                ));
                Lane { tx, handle, done }
            })
            .tx
            .clone()
    }

    /// Close `key`'s lane; its worker exits once the queue is empty
    fn retire(&self, key: &Path) {
        self.retiring.retain(|_, done| done.has_changed().is_ok());

        if let Some((key, lane)) = self.lanes.remove(key) {
            debug!(profile = %key.display(), "closing profile lane");
            self.retiring.insert(key, lane.done);
        }
    }

    async fn drain_retiring(&self) {
        let draining: Vec<_> = self.retiring.iter().map(|done| done.value().clone()).collect();
        for mut done in draining {
            // Resolves with an error once the worker drops its sender
            let _ = done.changed().await;
        }
        self.retiring.retain(|_, done| done.has_changed().is_ok());
    }
}

async fn run_lane(
    mut rx: mpsc::Receiver<LaneMsg>,
    pipeline: Arc<ProfilePipeline>,
    debounce: Duration,
    predecessor: Option<watch::Receiver<()>>,
    _done: watch::Sender<()>,
) {
    if let Some(mut previous) = predecessor {
        let _ = previous.changed().await;
    }

    let mut pending: Option<LaneMsg> = None;

    loop {
        let msg = match pending.take() {
            Some(msg) => msg,
            None => match rx.recv().await {
                Some(msg) => msg,
                None => break,
            },
        };

        match msg {
            LaneMsg::Barrier(done) => {
                let _ = done.send(());
            }
            LaneMsg::Op(op @ ProfileOp::Cascade(_)) => execute(&pipeline, op).await,
            LaneMsg::Op(op @ ProfileOp::Archive(_)) => {
                if !debounce.is_zero() {
                    tokio::time::sleep(debounce).await;
                    pending = coalesce(&mut rx, &op);
                }
                execute(&pipeline, op).await;
            }
        }
    }
}

/// Drop change requests queued behind `op`; return the first other message
fn coalesce(rx: &mut mpsc::Receiver<LaneMsg>, op: &ProfileOp) -> Option<LaneMsg> {
    let mut absorbed = 0usize;
    let next = loop {
        match rx.try_recv() {
            Ok(LaneMsg::Op(ProfileOp::Archive(_))) => absorbed += 1,
            Ok(other) => break Some(other),
            Err(_) => break None,
        }
    };

    if absorbed > 0 {
        debug!(profile = %op.profile().name(), absorbed, "coalesced change notifications");
    }
    next
}

async fn execute(pipeline: &Arc<ProfilePipeline>, op: ProfileOp) {
    let pipeline = Arc::clone(pipeline);
    if let Err(e) = tokio::task::spawn_blocking(move || pipeline.run(&op)).await {
        error!(error = %e, "profile operation panicked");
    }
}
