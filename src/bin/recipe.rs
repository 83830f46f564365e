use recipesnap::{commands::RecipeCommand, invocation};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    invocation::run(RecipeCommand).await
}
