use recipesnap::{commands::CaptionCommand, invocation};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    invocation::run(CaptionCommand).await
}
