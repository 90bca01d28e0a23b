// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed pool of rasterization threads.
//!
//! Each worker owns a bounded(1) request channel; all workers share one
//! response channel. Dispatch never queues: if no worker is idle the caller
//! gets [`DispatchError::Backoff`] and retries later.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded, unbounded,
};
use tiny_skia::Pixmap;

use crate::error::DispatchError;
use crate::protocol::{Request, Response, WorkerResources};

struct Worker {
    requests: Sender<Request>,
    busy: bool,
    thread: Option<JoinHandle<()>>,
}

/// Handle to the worker threads.
///
/// Dropping the pool shuts every worker down and joins it.
pub struct WorkerPool {
    workers: Vec<Worker>,
    responses: Receiver<Response>,
    initialized: bool,
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("idle", &self.idle_workers())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Spawn `count` workers (at least one).
    pub fn new(count: usize) -> io::Result<Self> {
        let (response_tx, responses) = unbounded();
        let mut workers = Vec::with_capacity(count.max(1));
        for i in 0..count.max(1) {
            let (requests, rx) = bounded(1);
            let tx = response_tx.clone();
            let thread = thread::Builder::new()
                .name(format!("understory-raster-{i}"))
                .spawn(move || run_worker(i, &rx, &tx))?;
            workers.push(Worker {
                requests,
                busy: false,
                thread: Some(thread),
            });
        }
        log::debug!("spawned {} raster workers", workers.len());
        Ok(Self {
            workers,
            responses,
            initialized: false,
        })
    }

    /// Number of workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Always false; a pool has at least one worker.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Whether [`init`](Self::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Workers with no outstanding request.
    pub fn idle_workers(&self) -> usize {
        self.workers.iter().filter(|w| !w.busy).count()
    }

    /// Hand every worker its resources.
    ///
    /// Returns once every worker has taken its Init off the queue, so the
    /// next dispatch finds the request slots free.
    ///
    /// # Panics
    ///
    /// If called twice; workers are initialised exactly once.
    pub fn init(&mut self, resources: Arc<WorkerResources>) -> Result<(), DispatchError> {
        assert!(!self.initialized, "worker pool initialised twice");
        for (i, w) in self.workers.iter().enumerate() {
            w.requests
                .send(Request::Init(resources.clone()))
                .map_err(|_| DispatchError::Disconnected(i))?;
        }
        for (i, w) in self.workers.iter().enumerate() {
            while !w.requests.is_empty() {
                if w.thread.as_ref().is_none_or(JoinHandle::is_finished) {
                    return Err(DispatchError::Disconnected(i));
                }
                thread::yield_now();
            }
        }
        self.initialized = true;
        Ok(())
    }

    /// Send a Render or RePatch to an idle worker and return its index.
    pub fn dispatch(&mut self, request: Request) -> Result<usize, DispatchError> {
        if !self.initialized {
            return Err(DispatchError::NotInitialized);
        }
        let mut request = request;
        for (i, w) in self.workers.iter_mut().enumerate() {
            if w.busy {
                continue;
            }
            match w.requests.try_send(request) {
                Ok(()) => {
                    w.busy = true;
                    return Ok(i);
                }
                Err(TrySendError::Full(back)) => request = back,
                Err(TrySendError::Disconnected(_)) => {
                    log::warn!("raster worker {i} disconnected");
                    return Err(DispatchError::Disconnected(i));
                }
            }
        }
        Err(DispatchError::Backoff)
    }

    /// Take one completion without blocking.
    pub fn try_recv(&mut self) -> Option<Response> {
        match self.responses.try_recv() {
            Ok(r) => Some(self.settle(r)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for one completion.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Response> {
        match self.responses.recv_timeout(timeout) {
            Ok(r) => Some(self.settle(r)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn settle(&mut self, response: Response) -> Response {
        if let Some(w) = self.workers.get_mut(response.worker) {
            w.busy = false;
        }
        response
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for w in &self.workers {
            let _ = w.requests.send(Request::Shutdown);
        }
        for (i, w) in self.workers.iter_mut().enumerate() {
            if let Some(t) = w.thread.take() {
                if t.join().is_err() {
                    log::warn!("raster worker {i} panicked");
                }
            }
        }
    }
}

fn run_worker(worker: usize, requests: &Receiver<Request>, responses: &Sender<Response>) {
    let mut resources: Option<Arc<WorkerResources>> = None;
    for request in requests {
        let key = request.completion_key();
        let raster = match request {
            Request::Init(r) => {
                assert!(resources.is_none(), "raster worker {worker} initialised twice");
                resources = Some(r);
                continue;
            }
            Request::Shutdown => break,
            Request::Render(job) => resources.as_deref().and_then(|res| {
                job.painter(res)
                    .render(&job.members, job.width, job.height)
                    .map(Arc::new)
            }),
            Request::RePatch { job, raster, dirty } => resources.as_deref().map(|res| {
                let mut raster = raster;
                let pixmap: &mut Pixmap = Arc::make_mut(&mut raster);
                job.painter(res).repatch(pixmap, &job.members, &dirty);
                raster
            }),
        };
        let Some((session, key)) = key else {
            continue;
        };
        log::trace!("worker {worker} finished {key:?}");
        let response = Response {
            worker,
            session,
            key,
            raster,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}
