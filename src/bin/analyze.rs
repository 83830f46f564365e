use recipesnap::{commands::AnalyzeCommand, invocation};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    invocation::run(AnalyzeCommand).await
}
