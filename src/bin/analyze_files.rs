// Runs one analysis session in-process and prints the stream as JSON.
use analysis_bridge::proto::analyze_project_response::Message;
use analysis_bridge::proto::{AnalyzeProjectRequest, AnalyzeProjectResponse, TextRange};
use analysis_bridge::{AnalysisSession, AnalysisWorker, Engine, ExternalEngine, UnavailableEngine};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "analyze_files", about = "Analyze files locally without a gRPC client")]
struct Args {
    /// Directory relative file paths are resolved against
    #[arg(long, default_value = ".")]
    base_dir: String,

    /// Rule to enable (repeatable)
    #[arg(long = "rule")]
    rules: Vec<String>,

    /// Configuration root (repeatable)
    #[arg(long = "tsconfig")]
    tsconfig_paths: Vec<String>,

    /// Analysis engine executable
    #[arg(long)]
    engine: Option<PathBuf>,

    files: Vec<String>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Report {
    #[serde(rename_all = "camelCase")]
    FileResult { file_path: String, issues: Vec<IssueReport> },
    AnalysisComplete,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueReport {
    rule_name: String,
    message: String,
    range: Option<[i32; 4]>,
    secondary_locations: Vec<SecondaryReport>,
}

#[derive(Serialize)]
struct SecondaryReport {
    message: String,
    range: Option<[i32; 4]>,
}

fn coordinates(range: Option<TextRange>) -> Option<[i32; 4]> {
    range.map(|r| [r.start_line, r.start_column, r.end_line, r.end_column])
}

impl From<AnalyzeProjectResponse> for Report {
    fn from(response: AnalyzeProjectResponse) -> Self {
        match response.message {
            Some(Message::FileResult(result)) => Report::FileResult {
                file_path: result.file_path,
                issues: result
                    .issues
                    .into_iter()
                    .map(|issue| IssueReport {
                        rule_name: issue.rule_name,
                        message: issue.message,
                        range: coordinates(issue.range),
                        secondary_locations: issue
                            .secondary_locations
                            .into_iter()
                            .map(|s| SecondaryReport {
                                message: s.message,
                                range: coordinates(s.range),
                            })
                            .collect(),
                    })
                    .collect(),
            },
            Some(Message::AnalysisComplete(_)) | None => Report::AnalysisComplete,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let engine: Box<dyn Engine> = match args.engine {
        Some(program) => Box::new(ExternalEngine::new(program, Vec::new())),
        None => Box::new(UnavailableEngine),
    };
    let request = AnalyzeProjectRequest {
        base_dir: args.base_dir,
        file_paths: args.files,
        rules: args.rules,
        tsconfig_paths: args.tsconfig_paths,
    };

    let mut messages: Vec<AnalyzeProjectResponse> = Vec::new();
    let summary = AnalysisSession::new(Arc::new(AnalysisWorker::new(engine)), request)
        .run(&mut messages)
        .await?;

    let reports: Vec<Report> = messages.into_iter().map(Report::from).collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    eprintln!(
        "{} requested, {} analyzed, {} skipped",
        summary.requested, summary.analyzed, summary.skipped
    );

    Ok(())
}
