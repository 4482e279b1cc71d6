// THEORY:
// The color families of a frame are independent of each other, so they can be
// processed at the same time. `ParallelConeDetector` does this with a small
// worker pool:
//
// - a dispatcher task receives `FamilyTask`s and hands them round-robin to the
//   workers over unbounded mpsc channels,
// - each worker runs the (CPU-bound) family pass on the blocking thread pool and
//   answers over the task's oneshot channel,
// - the caller awaits all answers with `join_all` and reassembles them in the
//   configured family order.
//
// The operating zone is cut once and shared read-only through an `Arc`, so no
// pixel data is copied per task. Output is identical to `ConeDetector`'s.

use crate::config::DetectorConfig;
use crate::core_modules::color_range::ColorFamily;
use crate::core_modules::frame::HsvFrame;
use crate::error::{DetectionError, Result};
use crate::pipeline::{ConeDetector, Detection, FamilyReport, FrameReport};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub struct FamilyTask {
    pub zone: Arc<HsvFrame>,
    pub offset_y: i32,
    pub family: ColorFamily,
    pub result_sender: oneshot::Sender<FamilyReport>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FamilyTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and `size` workers. Must be called from within a
    /// tokio runtime.
    pub fn new(detector: Arc<ConeDetector>, size: usize) -> Self {
        let size = size.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FamilyTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| mpsc::unbounded_channel::<FamilyTask>())
            .unzip();

        // Dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!(worker_idx, "worker channel closed, dropping task");
                }
                worker_idx = (worker_idx + 1) % size;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .map(|mut worker_receiver| {
                let worker_detector = Arc::clone(&detector);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        let FamilyTask {
                            zone,
                            offset_y,
                            family,
                            result_sender,
                        } = task;
                        let detector = Arc::clone(&worker_detector);
                        let outcome = tokio::task::spawn_blocking(move || {
                            detector.detect_family(&zone, offset_y, family)
                        })
                        .await;

                        match outcome {
                            Ok(report) => {
                                let _ = result_sender.send(report);
                            }
                            // Dropping the sender reports the failure to the caller.
                            Err(e) => warn!(%family, error = %e, "family pass panicked"),
                        }
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub async fn process_family(
        &self,
        zone: Arc<HsvFrame>,
        offset_y: i32,
        family: ColorFamily,
    ) -> Result<FamilyReport> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = FamilyTask {
            zone,
            offset_y,
            family,
            result_sender,
        };

        self.task_sender.send(task).map_err(|_| {
            DetectionError::WorkerPool("failed to send task to worker pool".to_string())
        })?;

        result_receiver.await.map_err(|_| {
            DetectionError::WorkerPool(format!("no result received for family {family}"))
        })
    }
}

/// Same results as `ConeDetector`, with the color families processed concurrently.
pub struct ParallelConeDetector {
    detector: Arc<ConeDetector>,
    worker_pool: WorkerPool,
}

impl ParallelConeDetector {
    /// One worker per logical CPU. Must be called from within a tokio runtime.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: DetectorConfig, workers: usize) -> Result<Self> {
        let detector = Arc::new(ConeDetector::new(config)?);
        let worker_pool = WorkerPool::new(Arc::clone(&detector), workers);
        debug!(workers = worker_pool.size(), "parallel detector ready");
        Ok(Self {
            detector,
            worker_pool,
        })
    }

    pub fn detector(&self) -> &ConeDetector {
        &self.detector
    }

    pub async fn detect(&self, frame: &HsvFrame) -> Result<Vec<Detection>> {
        Ok(self.detect_with_trace(frame).await?.detections())
    }

    pub async fn detect_with_trace(&self, frame: &HsvFrame) -> Result<FrameReport> {
        let zone = self.detector.operating_zone(frame)?;
        let offset_y = zone.offset_y;
        let shared_zone = Arc::new(zone.frame);

        let pending = self
            .detector
            .config()
            .families
            .iter()
            .map(|&family| {
                self.worker_pool
                    .process_family(Arc::clone(&shared_zone), offset_y, family)
            });
        let families = join_all(pending)
            .await
            .into_iter()
            .collect::<Result<Vec<FamilyReport>>>()?;

        Ok(FrameReport {
            frame_width: frame.width(),
            frame_height: frame.height(),
            zone_offset: offset_y,
            families,
        })
    }
}
