mod types;

pub use types::*;

use crate::{Error, Result, config, config::Config};
use async_trait::async_trait;
use clap::Parser;
use serde::Serialize;
use std::{env, ffi::OsString, iter, process::ExitCode};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "warn";

/// A single-shot model invocation: parse arguments, acquire the model or
/// service, run it once, and hand back the success payload.
#[async_trait]
pub trait Command: Send + Sync {
    type Args: Parser + Send + 'static;
    type Output: Serialize + Default + Send;

    const NAME: &'static str;
    const USAGE: &'static str;

    async fn execute(&self, args: Self::Args, config: &Config) -> Result<Self::Output>;
}

/// Runs `command` against the process arguments, prints the envelope and
/// returns the matching exit code.
pub async fn run<C: Command>(command: C) -> ExitCode {
    let envelope = invoke(&command, std::env::args_os()).await;
    println!("{}", envelope.to_json_line());
    ExitCode::from(envelope.exit_status())
}

/// Produces the envelope for one invocation. `args` includes the program
/// name in first position.
pub async fn invoke<C, I, A>(command: &C, args: I) -> Envelope<C::Output>
where
    C: Command,
    I: IntoIterator<Item = A>,
    A: Into<OsString> + Clone,
{
    let args = match parse_args::<C, _, _>(args) {
        Ok(args) => args,
        Err(e) => return Envelope::failure(&e),
    };

    // RUST_LOG wins over the configured level, so it can apply to loading too.
    if env::var_os("RUST_LOG").is_some() {
        init_logging(DEFAULT_LOG_LEVEL);
    }

    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            init_logging(DEFAULT_LOG_LEVEL);
            error!(command = C::NAME, "Failed to load configuration: {}", e);
            return Envelope::failure(&e);
        }
    };

    init_logging(&config.logs.level);

    info!(command = C::NAME, "Starting invocation");

    match command.execute(args, &config).await {
        Ok(output) => {
            info!(command = C::NAME, "Invocation succeeded");
            Envelope::success(output)
        }
        Err(e) => {
            error!(command = C::NAME, "Invocation failed: {}", e);
            Envelope::failure(&e)
        }
    }
}

/// Parses the command line for `C`. Every argument after the program name
/// is data, including `--` and values that look like flags.
pub fn parse_args<C, I, A>(args: I) -> Result<C::Args>
where
    C: Command,
    I: IntoIterator<Item = A>,
    A: Into<OsString> + Clone,
{
    let mut args = args.into_iter().map(Into::<OsString>::into);
    let program = args.next();
    let argv = program
        .into_iter()
        .chain(iter::once(OsString::from("--")))
        .chain(args);

    C::Args::try_parse_from(argv).map_err(|e| {
        debug!("Rejected arguments for {}: {:?}", C::NAME, e.kind());
        Error::usage(C::USAGE)
    })
}

/// Structured logs go to stderr; stdout carries only the envelope.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    // A second initialization in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();
}

/// Runs CPU-bound inference off the async runtime and waits for it.
pub(crate) async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::internal(format!("Inference task failed: {}", e)))?
}
