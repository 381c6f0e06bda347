use analysis_bridge::grpc_server::{BridgeServer, BridgeService};
use analysis_bridge::proto::analyzer_service_client::AnalyzerServiceClient;
use analysis_bridge::proto::analyzer_service_server::AnalyzerService;
use analysis_bridge::proto::{AliveRequest, AnalyzeProjectRequest, AnalyzeProjectResponse};
use analysis_bridge::{AnalysisContext, AnalysisError, Diagnostic, Engine, TextSpan, UnavailableEngine};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_stream::StreamExt;
use tonic::Request;

/// Reports one issue per file, named after the file.
struct EchoEngine;

#[tonic::async_trait]
impl Engine for EchoEngine {
    async fn analyze(&self, file: &Path, ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
        let name = file.file_name().unwrap().to_string_lossy().to_string();
        let rules = ctx.rules.join(",");
        Ok(vec![Diagnostic::new(rules, name, TextSpan::new(1, 0, 1, 5))
            .with_secondary("related", TextSpan::new(2, 1, 2, 3))])
    }
}

/// Holds every analysis until the test releases it.
struct GatedEngine {
    gate: Mutex<mpsc::Receiver<()>>,
}

#[tonic::async_trait]
impl Engine for GatedEngine {
    async fn analyze(&self, file: &Path, _ctx: &AnalysisContext) -> Result<Vec<Diagnostic>, AnalysisError> {
        match self.gate.lock().await.recv().await {
            Some(()) => Ok(Vec::new()),
            None => Err(AnalysisError::EngineFailed {
                path: file.to_path_buf(),
                source: anyhow::anyhow!("gate dropped"),
            }),
        }
    }
}

fn project(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for file in files {
        fs::write(dir.path().join(file), "let a: any;\n").unwrap();
    }
    dir
}

fn request(dir: &TempDir, files: &[&str]) -> AnalyzeProjectRequest {
    AnalyzeProjectRequest {
        base_dir: dir.path().display().to_string(),
        file_paths: files.iter().map(|f| f.to_string()).collect(),
        rules: vec!["no-any".to_string()],
        tsconfig_paths: vec!["tsconfig.json".to_string()],
    }
}

#[tokio::test]
async fn is_alive_while_analysis_is_in_flight() {
    let dir = project(&["a.ts"]);
    let (release, gate) = mpsc::channel(1);
    let service = BridgeService::new(
        GatedEngine {
            gate: Mutex::new(gate),
        },
        1,
    );

    let mut stream = service
        .analyze_project(Request::new(request(&dir, &["a.ts"])))
        .await
        .unwrap()
        .into_inner();

    let alive = tokio::time::timeout(Duration::from_secs(5), service.is_alive(Request::new(AliveRequest {})))
        .await
        .expect("is_alive must not wait for analysis")
        .unwrap();
    assert_eq!(alive.into_inner().status, "ok");

    release.send(()).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.as_file_result().unwrap().file_path, "a.ts");
    assert!(stream.next().await.unwrap().unwrap().is_complete());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn is_alive_with_unreachable_engine() {
    let service = BridgeService::new(UnavailableEngine, 1);

    let response = service.is_alive(Request::new(AliveRequest {})).await.unwrap();

    assert_eq!(response.into_inner().status, "ok");
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let first_dir = project(&["a.ts", "b.ts"]);
    let second_dir = project(&["x.ts"]);
    let service = BridgeService::new(EchoEngine, 2);

    let first = service
        .analyze_project(Request::new(request(&first_dir, &["a.ts", "b.ts"])))
        .await
        .unwrap()
        .into_inner();
    let second = service
        .analyze_project(Request::new(request(&second_dir, &["x.ts"])))
        .await
        .unwrap()
        .into_inner();

    let (first, second): (Vec<_>, Vec<_>) = tokio::join!(first.collect(), second.collect());

    let paths = |messages: Vec<Result<AnalyzeProjectResponse, tonic::Status>>| -> Vec<String> {
        messages
            .into_iter()
            .filter_map(|m| m.unwrap().as_file_result().map(|r| r.file_path.clone()))
            .collect()
    };
    assert_eq!(paths(first), vec!["a.ts", "b.ts"]);
    assert_eq!(paths(second), vec!["x.ts"]);
}

#[tokio::test]
async fn round_trip_over_grpc() {
    let dir = project(&["a.ts", "b.ts"]);
    let server = BridgeServer::bind_with(
        "127.0.0.1:0".parse().unwrap(),
        BridgeService::new(EchoEngine, 4),
        4 * 1024 * 1024,
    )
    .await
    .unwrap();
    let addr = server.local_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(async {
        let _ = stopped.await;
    }));

    let mut client = AnalyzerServiceClient::connect(format!("http://{}", addr))
        .await
        .unwrap();

    let alive = client.is_alive(AliveRequest {}).await.unwrap().into_inner();
    assert_eq!(alive.status, "ok");

    let mut stream = client
        .analyze_project(request(&dir, &["a.ts", "missing.ts", "b.ts"]))
        .await
        .unwrap()
        .into_inner();
    let mut messages = Vec::new();
    while let Some(message) = stream.message().await.unwrap() {
        messages.push(message);
    }

    assert_eq!(messages.len(), 3);
    let a = messages[0].as_file_result().unwrap();
    assert_eq!(a.file_path, "a.ts");
    assert_eq!(a.issues[0].rule_name, "no-any");
    assert_eq!(a.issues[0].message, "a.ts");
    assert_eq!(a.issues[0].secondary_locations[0].message, "related");
    assert_eq!(a.issues[0].secondary_locations[0].range.as_ref().unwrap().start_column, 1);
    assert_eq!(messages[1].as_file_result().unwrap().file_path, "b.ts");
    assert!(messages[2].is_complete());

    drop(stream);
    drop(client);
    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
