use crate::core::engine::Engine;
use crate::core::worker::{AnalysisContext, AnalysisWorker};
use crate::error::SessionError;
use crate::proto::{AnalyzeProjectRequest, AnalyzeProjectResponse};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tonic::Status;
use uuid::Uuid;

/// Where a session writes its messages, in generation order.
#[tonic::async_trait]
pub trait ResponseSink: Send + Sync {
    async fn send(&mut self, message: AnalyzeProjectResponse) -> Result<(), SessionError>;

    /// True once the receiving side is gone and nothing sent would be read.
    fn is_closed(&self) -> bool {
        false
    }

    /// Resolves when the receiving side goes away. Never resolves by default.
    async fn closed(&self) {
        std::future::pending::<()>().await
    }
}

#[tonic::async_trait]
impl ResponseSink for mpsc::Sender<Result<AnalyzeProjectResponse, Status>> {
    async fn send(&mut self, message: AnalyzeProjectResponse) -> Result<(), SessionError> {
        mpsc::Sender::send(self, Ok(message))
            .await
            .map_err(|_| SessionError::StreamClosed)
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }

    async fn closed(&self) {
        mpsc::Sender::closed(self).await
    }
}

#[tonic::async_trait]
impl ResponseSink for Vec<AnalyzeProjectResponse> {
    async fn send(&mut self, message: AnalyzeProjectResponse) -> Result<(), SessionError> {
        self.push(message);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub requested: usize,
    pub analyzed: usize,
    pub skipped: usize,
}

/// Drives one AnalyzeProject request from the first file to the completion marker.
///
/// Files are analyzed strictly in request order. A file that fails is logged and
/// left out of the stream; a sink that stops accepting messages ends the session
/// without a completion marker.
pub struct AnalysisSession<E> {
    id: Uuid,
    worker: Arc<AnalysisWorker<E>>,
    context: AnalysisContext,
    file_paths: Vec<String>,
}

impl<E: Engine + 'static> AnalysisSession<E> {
    pub fn new(worker: Arc<AnalysisWorker<E>>, request: AnalyzeProjectRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            worker,
            context: AnalysisContext::from(&request),
            file_paths: request.file_paths,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn run<S: ResponseSink + ?Sized>(mut self, sink: &mut S) -> Result<SessionSummary, SessionError> {
        let file_paths = std::mem::take(&mut self.file_paths);
        let mut summary = SessionSummary {
            requested: file_paths.len(),
            ..Default::default()
        };

        info!(
            "session {}: analyzing {} files under {} with {} rules",
            self.id,
            summary.requested,
            self.context.base_dir.display(),
            self.context.rules.len()
        );

        for file_path in file_paths {
            if sink.is_closed() {
                info!("session {}: caller went away, stopping before {}", self.id, file_path);
                return Err(SessionError::StreamClosed);
            }

            // The file in flight is abandoned as soon as the caller leaves.
            let outcome = tokio::select! {
                outcome = self.worker.analyze(&file_path, &self.context) => outcome,
                _ = sink.closed() => {
                    info!("session {}: caller went away while analyzing {}", self.id, file_path);
                    return Err(SessionError::StreamClosed);
                }
            };

            match outcome {
                Ok(diagnostics) => {
                    debug!("session {}: {} issues in {}", self.id, diagnostics.len(), file_path);
                    sink.send(AnalyzeProjectResponse::file_result(file_path, diagnostics))
                        .await?;
                    summary.analyzed += 1;
                }
                Err(e) => {
                    warn!("session {}: skipping {}: {}", self.id, file_path, e);
                    summary.skipped += 1;
                }
            }
        }

        sink.send(AnalyzeProjectResponse::complete()).await?;

        info!(
            "session {}: completed, {} analyzed, {} skipped",
            self.id, summary.analyzed, summary.skipped
        );
        Ok(summary)
    }
}
