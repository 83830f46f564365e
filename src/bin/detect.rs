use recipesnap::{commands::DetectCommand, invocation};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    invocation::run(DetectCommand).await
}
