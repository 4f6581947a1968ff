//! Serial request dispatch.
//!
//! One task owns the `OrderService` and handles queued requests strictly one
//! at a time, in arrival order. Transports hold a cloneable `Dispatcher`,
//! enqueue a request with a `oneshot` reply slot, and await the answer.

use platebook_core::ipc::{PlatebookRequest, PlatebookResponse};
use platebook_core::OrderService;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::router;

struct Job {
    request: PlatebookRequest,
    reply: oneshot::Sender<PlatebookResponse>,
}

#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Job>,
}

impl Dispatcher {
    /// Start the dispatch task. It exits once every `Dispatcher` clone is dropped.
    pub fn spawn(service: OrderService, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run(service, rx));
        (Self { tx }, handle)
    }

    pub async fn dispatch(&self, request: PlatebookRequest) -> PlatebookResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            request,
            reply: reply_tx,
        };

        if self.tx.send(job).await.is_err() {
            return PlatebookResponse::err("Dispatcher is not running");
        }

        reply_rx
            .await
            .unwrap_or_else(|_| PlatebookResponse::err("Dispatcher dropped the request"))
    }
}

async fn run(service: OrderService, mut rx: mpsc::Receiver<Job>) {
    tracing::info!("Dispatcher started");
    while let Some(job) = rx.recv().await {
        let response = router::handle_request(job.request, &service).await;
        // The caller may have gone away (connection closed); nothing to do then.
        let _ = job.reply.send(response);
    }
    tracing::info!("Dispatcher stopped");
}
