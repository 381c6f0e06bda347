// src/grpc_server.rs
use crate::config::Config;
use crate::core::engine::Engine;
use crate::core::session::AnalysisSession;
use crate::core::worker::AnalysisWorker;
use crate::error::BridgeError;
use crate::proto::analyzer_service_server::{AnalyzerService, AnalyzerServiceServer};
use crate::proto::{AliveRequest, AliveResponse, AnalyzeProjectRequest, AnalyzeProjectResponse};
use log::{info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status};

pub struct BridgeService<E> {
    worker: Arc<AnalysisWorker<E>>,
    stream_buffer: usize,
}

impl<E: Engine + 'static> BridgeService<E> {
    pub fn new(engine: E, stream_buffer: usize) -> Self {
        Self {
            worker: Arc::new(AnalysisWorker::new(engine)),
            stream_buffer: stream_buffer.max(1),
        }
    }
}

#[tonic::async_trait]
impl<E: Engine + 'static> AnalyzerService for BridgeService<E> {
    type AnalyzeProjectStream = ReceiverStream<Result<AnalyzeProjectResponse, Status>>;

    async fn analyze_project(
        &self,
        req: Request<AnalyzeProjectRequest>,
    ) -> Result<Response<Self::AnalyzeProjectStream>, Status> {
        let request = req.into_inner();
        let session = AnalysisSession::new(Arc::clone(&self.worker), request);
        let (mut tx, rx) = mpsc::channel(self.stream_buffer);

        // Detached so the first file result reaches the caller before the rest are analyzed.
        tokio::spawn(async move {
            let id = session.id();
            if let Err(e) = session.run(&mut tx).await {
                warn!("session {} aborted: {}", id, e);
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn is_alive(&self, _req: Request<AliveRequest>) -> Result<Response<AliveResponse>, Status> {
        Ok(Response::new(AliveResponse::ok()))
    }
}

/// The process-wide listener together with the service it serves.
pub struct BridgeServer<E> {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: BridgeService<E>,
    max_message_size: usize,
}

impl BridgeServer<Box<dyn Engine>> {
    /// Binds the configured address. Failing here means nothing was served.
    pub async fn bind(config: &Config) -> Result<Self, BridgeError> {
        let addr = config.socket_addr()?;
        let service = BridgeService::new(config.engine(), usize::from(config.stream_buffer));
        Self::bind_with(addr, service, config.max_message_size).await
    }
}

impl<E: Engine + 'static> BridgeServer<E> {
    pub async fn bind_with(
        addr: SocketAddr,
        service: BridgeService<E>,
        max_message_size: usize,
    ) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BridgeError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BridgeError::Bind { addr, source })?;

        Ok(Self {
            listener,
            local_addr,
            service,
            max_message_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until `signal` resolves, then stops accepting calls and returns.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), BridgeError>
    where
        F: Future<Output = ()> + Send,
    {
        let service = AnalyzerServiceServer::new(self.service)
            .max_decoding_message_size(self.max_message_size)
            .max_encoding_message_size(self.max_message_size);

        info!("gRPC server listening on {}", self.local_addr);

        Server::builder()
            .add_service(service)
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), signal)
            .await?;

        info!("gRPC server on {} stopped", self.local_addr);
        Ok(())
    }
}
