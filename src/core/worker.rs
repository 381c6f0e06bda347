use crate::core::engine::Engine;
use crate::diagnostic::Diagnostic;
use crate::error::AnalysisError;
use crate::proto::AnalyzeProjectRequest;
use log::warn;
use std::path::{Path, PathBuf};

/// Request-wide settings shared by every file of one session.
///
/// Built from a request, `base_dir` is absolute: an empty base directory means the
/// bridge's working directory and a relative one is taken relative to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    pub base_dir: PathBuf,
    pub rules: Vec<String>,
    pub tsconfig_paths: Vec<String>,
}

impl AnalysisContext {
    /// Absolute paths are kept, relative ones are joined onto the base directory.
    pub fn resolve(&self, file_path: &str) -> PathBuf {
        let path = Path::new(file_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl From<&AnalyzeProjectRequest> for AnalysisContext {
    fn from(request: &AnalyzeProjectRequest) -> Self {
        AnalysisContext {
            base_dir: absolute_base_dir(&request.base_dir),
            rules: request.rules.clone(),
            tsconfig_paths: request.tsconfig_paths.clone(),
        }
    }
}

fn absolute_base_dir(base_dir: &str) -> PathBuf {
    let path = PathBuf::from(base_dir);
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) if base_dir.is_empty() => cwd,
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            warn!("cannot determine working directory, keeping base dir {:?}: {}", base_dir, e);
            path
        }
    }
}

/// Runs the engine against one file at a time.
pub struct AnalysisWorker<E> {
    engine: E,
}

impl<E: Engine> AnalysisWorker<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub async fn analyze(&self, file_path: &str, ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
        let resolved = ctx.resolve(file_path);

        let unreadable = |source| AnalysisError::FileUnreadable {
            path: resolved.clone(),
            source,
        };
        let metadata = {
            let file = tokio::fs::File::open(&resolved).await.map_err(unreadable)?;
            file.metadata().await.map_err(unreadable)?
        };
        if !metadata.is_file() {
            return Err(AnalysisError::FileUnreadable {
                path: resolved,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        self.engine.analyze(&resolved, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::TextSpan;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Vec<PathBuf>>,
    }

    #[tonic::async_trait]
    impl Engine for RecordingEngine {
        async fn analyze(&self, file: &Path, _ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
            self.seen.lock().unwrap().push(file.to_path_buf());
            Ok(vec![Diagnostic::new("r", "m", TextSpan::new(1, 0, 1, 1))])
        }
    }

    fn context(dir: &TempDir) -> AnalysisContext {
        AnalysisContext {
            base_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_relative_against_base_dir() {
        let ctx = AnalysisContext {
            base_dir: PathBuf::from("/proj"),
            ..Default::default()
        };

        assert_eq!(ctx.resolve("src/a.ts"), PathBuf::from("/proj/src/a.ts"));
    }

    #[cfg(unix)]
    #[test]
    fn keeps_absolute_paths() {
        let ctx = AnalysisContext {
            base_dir: PathBuf::from("/proj"),
            ..Default::default()
        };

        assert_eq!(ctx.resolve("/other/b.ts"), PathBuf::from("/other/b.ts"));
    }

    #[test]
    fn context_from_request_keeps_order_and_duplicates() {
        let request = AnalyzeProjectRequest {
            base_dir: "/proj".to_string(),
            file_paths: vec!["a.ts".to_string()],
            rules: vec!["b".to_string(), "a".to_string(), "b".to_string()],
            tsconfig_paths: vec!["x/tsconfig.json".to_string(), "tsconfig.json".to_string()],
        };

        let ctx = AnalysisContext::from(&request);

        assert_eq!(ctx.base_dir, PathBuf::from("/proj"));
        assert_eq!(ctx.rules, vec!["b", "a", "b"]);
        assert_eq!(ctx.tsconfig_paths, vec!["x/tsconfig.json", "tsconfig.json"]);
    }

    #[test]
    fn empty_base_dir_is_working_directory() {
        let request = AnalyzeProjectRequest::default();

        let ctx = AnalysisContext::from(&request);

        assert_eq!(ctx.base_dir, std::env::current_dir().unwrap());
        assert!(ctx.resolve("a.ts").is_absolute());
    }

    #[test]
    fn relative_base_dir_is_made_absolute() {
        let request = AnalyzeProjectRequest {
            base_dir: "proj".to_string(),
            ..Default::default()
        };

        let ctx = AnalysisContext::from(&request);

        assert_eq!(ctx.base_dir, std::env::current_dir().unwrap().join("proj"));
        assert_eq!(ctx.resolve("a.ts"), std::env::current_dir().unwrap().join("proj/a.ts"));
    }

    #[tokio::test]
    async fn passes_resolved_path_to_engine() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "let x: any;").unwrap();
        let worker = AnalysisWorker::new(RecordingEngine::default());

        let diagnostics = worker.analyze("a.ts", &context(&dir)).await.unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(*worker.engine().seen.lock().unwrap(), vec![dir.path().join("a.ts")]);
    }

    #[tokio::test]
    async fn missing_file_never_reaches_engine() {
        let dir = TempDir::new().unwrap();
        let worker = AnalysisWorker::new(RecordingEngine::default());

        let err = worker.analyze("missing.ts", &context(&dir)).await.unwrap_err();

        assert!(matches!(err, AnalysisError::FileUnreadable { .. }));
        assert!(worker.engine().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let worker = AnalysisWorker::new(RecordingEngine::default());

        let err = worker.analyze("src", &context(&dir)).await.unwrap_err();

        assert!(matches!(err, AnalysisError::FileUnreadable { .. }));
    }
}
