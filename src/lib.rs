pub mod core {
    pub mod engine;
    pub mod session;
    pub mod worker;
}

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod grpc_server;
pub mod protobuf_converter;

// Bindings for proto/analyzer.proto. Regenerated by build.rs when protoc is available.
#[allow(clippy::all)]
pub mod proto {
    include!("proto/analyzer.rs");
}

pub use crate::core::engine::{Engine, ExternalEngine, UnavailableEngine};
pub use crate::core::session::{AnalysisSession, ResponseSink, SessionSummary};
pub use crate::core::worker::{AnalysisContext, AnalysisWorker};
pub use crate::diagnostic::{Diagnostic, SecondaryDiagnostic, TextSpan};
pub use crate::error::{AnalysisError, BridgeError, SessionError};
