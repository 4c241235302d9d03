// src/crawl/worker.rs
// =============================================================================
// A crawl worker: take a task, fetch it, hand back the result. Repeat.
//
// Workers never look at the visited set or decide what to crawl next. That is
// the dispatcher's job, so workers need no locks at all.
//
// Every place a worker can wait (receiving a task, fetching, sending the
// result) also listens to the cancellation token, so a cancelled crawl never
// leaves a worker stuck.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::task::{CrawlResult, CrawlTask};
use crate::checker::PageFetcher;

// Receiving side of the task queue, shared by all workers
//
// mpsc has a single receiver, so workers take turns through an async Mutex.
// The lock is held only while waiting for the next task.
pub(crate) type SharedTasks = Arc<Mutex<mpsc::Receiver<CrawlTask>>>;

pub(crate) struct Worker<F> {
    pub id: usize,
    pub fetcher: Arc<F>,
    pub tasks: SharedTasks,
    pub results: mpsc::Sender<CrawlResult>,
    pub cancel: CancellationToken,
    pub request_delay: Duration,
}

impl<F: PageFetcher> Worker<F> {
    pub async fn run(self) {
        debug!(worker = self.id, "worker started");

        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                task = next_task(&self.tasks) => match task {
                    Some(task) => task,
                    // Task queue closed: the crawl is over
                    None => break,
                },
            };

            trace!(worker = self.id, url = %task.url, depth = task.depth, "picked up task");

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = async {
                    // Be polite to the server
                    if !self.request_delay.is_zero() {
                        tokio::time::sleep(self.request_delay).await;
                    }
                    self.fetcher.fetch(&task.url).await
                } => outcome,
            };

            let result = CrawlResult::new(task, outcome);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.results.send(result) => {
                    if sent.is_err() {
                        // Nobody is listening for results anymore
                        break;
                    }
                }
            }
        }

        debug!(worker = self.id, "worker stopped");
    }
}

async fn next_task(tasks: &SharedTasks) -> Option<CrawlTask> {
    tasks.lock().await.recv().await
}
