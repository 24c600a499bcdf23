//! chorus - ask several language models at once and let one of them judge
//!
//! This library fans a single prompt out to several text-generation models
//! concurrently, collects their answers in a stable order, and asks a judge
//! model which answer is best.

#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough

pub mod backend;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod judge;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod types;
pub mod ui;

// Re-export important structs and functions for easier testing
pub use backend::{Backend, HttpBackend};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::{ChorusError, ErrorKind};
pub use judge::Judge;
pub use models::{CallShape, ModelSpec};
pub use orchestrator::{Orchestrator, Outcome};
pub use types::{AggregateResult, CallResult, JudgmentResult, Request};
