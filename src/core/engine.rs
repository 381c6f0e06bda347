use crate::core::worker::AnalysisContext;
use crate::diagnostic::Diagnostic;
use crate::error::AnalysisError;
use anyhow::{anyhow, Context};
use log::debug;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[tonic::async_trait]
pub trait Engine: Send + Sync {
    /// Analyze a single resolved file and return its findings in engine order.
    ///
    /// Dropping the returned future abandons the file.
    async fn analyze(&self, file: &Path, ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError>;
}

#[tonic::async_trait]
impl<E: Engine + ?Sized> Engine for Box<E> {
    async fn analyze(&self, file: &Path, ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
        (**self).analyze(file, ctx).await
    }
}

/// Stand-in used when no engine executable is configured. Every file fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEngine;

#[tonic::async_trait]
impl Engine for UnavailableEngine {
    async fn analyze(&self, _file: &Path, _ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
        Err(AnalysisError::EngineUnavailable)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineRequest<'a> {
    file_path: &'a Path,
    base_dir: &'a Path,
    rules: &'a [String],
    tsconfig_paths: &'a [String],
}

/// Runs an external analyzer executable once per file.
///
/// The request goes to the child's stdin as one JSON object and the child answers
/// with a JSON array of diagnostics on stdout. A non-zero exit status is a failure.
/// The child is killed if the analysis is abandoned before it exits.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn run(&self, file: &Path, ctx: &AnalysisContext) -> anyhow::Result<Vec<u8>> {
        let request = EngineRequest {
            file_path: file,
            base_dir: &ctx.base_dir,
            rules: &ctx.rules,
            tsconfig_paths: &ctx.tsconfig_paths,
        };
        let payload = serde_json::to_vec(&request)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !ctx.base_dir.as_os_str().is_empty() {
            command.current_dir(&ctx.base_dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start {}", self.program.display()))?;
        let mut stdin = child.stdin.take().context("engine stdin is not piped")?;

        // stdin is fed while stdout and stderr drain, so neither side can fill a pipe and stall.
        let feed = async move {
            let written = stdin.write_all(&payload).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.context("failed to wait for engine")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            ));
        }

        // An engine may answer without reading its whole request.
        match written {
            Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                Err(e).context("failed to write request to engine stdin")
            }
            _ => Ok(output.stdout),
        }
    }
}

#[tonic::async_trait]
impl Engine for ExternalEngine {
    async fn analyze(&self, file: &Path, ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
        let stdout = self.run(file, ctx).await.map_err(|source| AnalysisError::EngineFailed {
            path: file.to_path_buf(),
            source,
        })?;

        let diagnostics: Vec<Diagnostic> =
            serde_json::from_slice(&stdout).map_err(|source| AnalysisError::InvalidEngineOutput {
                path: file.to_path_buf(),
                source,
            })?;

        debug!("{} reported {} diagnostics for {}", self.program.display(), diagnostics.len(), file.display());
        Ok(diagnostics)
    }
}
