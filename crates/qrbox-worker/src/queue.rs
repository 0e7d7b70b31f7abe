//! Detection queue: bounded concurrent background detection with tracked
//! tasks and graceful drain.
//!
//! `submit` is called exactly once per upload, right after the row is
//! inserted, and never blocks the request path: the task is spawned
//! immediately and waits for a worker permit inside its own future. Once
//! submitted, a run is not cancellable; its outcome is written to the store
//! whether or not anyone is still polling.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use qrbox_db::UploadRepository;
use qrbox_processing::decoder;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Detection queue is shutting down")]
    ShuttingDown,
}

#[derive(Clone)]
pub struct DetectionQueue {
    uploads: UploadRepository,
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    draining: Arc<AtomicBool>,
}

impl DetectionQueue {
    pub fn new(uploads: UploadRepository, max_workers: usize) -> Self {
        tracing::info!(max_workers, "Detection queue started");
        Self {
            uploads,
            semaphore: Arc::new(Semaphore::new(max_workers.max(1))),
            tracker: TaskTracker::new(),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Schedule detection for an upload. Returns an error only when the
    /// queue is draining during shutdown; the caller then marks the upload
    /// failed instead of leaving it stuck in `processing`.
    #[tracing::instrument(skip(self, image_path), fields(upload_id = %upload_id))]
    pub fn submit(&self, upload_id: Uuid, image_path: PathBuf) -> Result<(), QueueError> {
        if self.draining.load(Ordering::SeqCst) {
            return Err(QueueError::ShuttingDown);
        }

        let uploads = self.uploads.clone();
        let semaphore = self.semaphore.clone();

        self.tracker.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed; this arm is unreachable but
                // must not panic the task.
                Err(_) => return,
            };
            run_detection(uploads, upload_id, image_path).await;
        });

        Ok(())
    }

    /// Number of detection runs still in flight (or queued for a permit).
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting submissions and wait up to `grace` for in-flight runs
    /// to finish. Runs that outlast the grace period keep executing until
    /// the process exits; their uploads may be re-observed as stuck
    /// `processing` rows after a restart.
    pub async fn shutdown(&self, grace: Duration) {
        self.draining.store(true, Ordering::SeqCst);
        self.tracker.close();

        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(
                pending,
                grace_secs = grace.as_secs(),
                "Draining detection queue"
            );
        }

        if tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.len(),
                "Detection queue drain timed out, abandoning remaining runs"
            );
        } else {
            tracing::info!("Detection queue drained");
        }
    }
}

/// One detection run: decode off the async runtime, then write the terminal
/// state. Decode failures become a `failed` upload, never a crash.
async fn run_detection(uploads: UploadRepository, upload_id: Uuid, image_path: PathBuf) {
    let started = Instant::now();

    let path_for_decode = image_path.clone();
    let outcome =
        tokio::task::spawn_blocking(move || decoder::detect_codes(&path_for_decode)).await;

    match outcome {
        Ok(Ok(codes)) => {
            let elapsed_ms = started.elapsed().as_millis() as i64;
            match uploads
                .complete_with_codes(upload_id, &codes, elapsed_ms)
                .await
            {
                Ok(true) => {
                    tracing::info!(
                        %upload_id,
                        code_count = codes.len(),
                        elapsed_ms,
                        "Detection completed"
                    );
                }
                Ok(false) => {
                    tracing::warn!(
                        %upload_id,
                        "Upload already terminal, detection result discarded"
                    );
                }
                Err(e) => {
                    tracing::error!(%upload_id, error = %e, "Failed to persist detection result");
                }
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(%upload_id, error = %e, "Detection failed");
            fail_upload(&uploads, upload_id, &e.to_string()).await;
        }
        Err(join_err) => {
            tracing::error!(%upload_id, error = %join_err, "Detection task panicked");
            fail_upload(
                &uploads,
                upload_id,
                &format!("Detection task panicked: {}", join_err),
            )
            .await;
        }
    }
}

async fn fail_upload(uploads: &UploadRepository, upload_id: Uuid, message: &str) {
    match uploads.mark_failed(upload_id, message).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(%upload_id, "Upload already terminal, failure not recorded");
        }
        Err(e) => {
            tracing::error!(%upload_id, error = %e, "Failed to mark upload as failed");
        }
    }
}
