//! In-memory transport and diagnostic sink shared by the unit tests.

use crate::diagnostics::DiagnosticSink;
use crate::error::{DispatchFailure, TransportError};
use crate::transport::{PushRequest, Transport};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

#[derive(Debug, Clone)]
pub struct Attempt {
    pub url: String,
    pub request: PushRequest,
}

/// Records every attempt; urls in `failing` answer with status 400.
#[derive(Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<Attempt>>,
    failing: HashSet<String>,
    barrier: Option<Arc<Barrier>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RecordingTransport {
            failing: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every attempt waits on `barrier` before answering.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.attempts().into_iter().map(|a| a.url).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, url: &str, request: &PushRequest) -> Result<(), TransportError> {
        self.attempts.lock().unwrap().push(Attempt {
            url: url.to_string(),
            request: request.clone(),
        });
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.failing.contains(url) {
            Err(TransportError::Status {
                status: 400,
                body: "rejected".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    reports: Mutex<Vec<DispatchFailure>>,
}

impl RecordingDiagnostics {
    pub fn reports(&self) -> Vec<DispatchFailure> {
        self.reports.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, failure: &DispatchFailure) {
        self.reports.lock().unwrap().push(failure.clone());
    }
}
