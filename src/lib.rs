pub mod commands;
pub mod config;
pub mod error;
pub mod invocation;
pub mod llm;
pub mod recipe;
pub mod vision;

pub use error::{Error, Result};
